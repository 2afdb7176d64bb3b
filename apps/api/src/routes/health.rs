use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports the service version and which backends this instance runs with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let storage = if state.config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };

    Json(json!({
        "status": "ok",
        "service": "tailor-api",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "provider_configured": state.config.gemini_api_key.is_some(),
    }))
}
