pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::proxy::handlers as proxy;
use crate::state::AppState;
use crate::tools::handlers as tools;
use crate::usage::handlers as usage;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Edge functions
        .route("/functions/v1/gemini-proxy", post(proxy::handle_generate))
        .route("/functions/v1/elevenlabs-tts", post(tools::handle_tts))
        .route("/functions/v1/fetch-url", post(tools::handle_fetch_url))
        // Usage gate
        .route("/api/v1/usage/:user_id", get(usage::handle_usage_status))
        .route(
            "/api/v1/usage/:user_id/increment",
            post(usage::handle_increment),
        )
        .route(
            "/api/v1/usage/:user_id/teaser/:tool",
            post(usage::handle_claim_teaser),
        )
        .with_state(state)
}
