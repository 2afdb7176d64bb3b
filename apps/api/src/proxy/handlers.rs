//! Axum route handler for the generation edge function.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::errors::AppError;
use crate::models::generation::GenerationRequest;
use crate::proxy::{CacheStatus, ProxyError};
use crate::state::AppState;

/// Response header reporting whether the body came from the cache table.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// POST /functions/v1/gemini-proxy
///
/// Provider-reported errors (bad model, safety block, quota) come back as the
/// provider's raw JSON so the caller can read them. Their status is 200 unless
/// `PRESERVE_UPSTREAM_STATUS` is set.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let error_cache_status = match request.server_cache_key() {
        Some(_) => CacheStatus::Miss,
        None => CacheStatus::Bypass,
    };

    match state.proxy.generate(request).await {
        Ok(outcome) => Ok((
            StatusCode::OK,
            [(CACHE_STATUS_HEADER, outcome.cache.as_str())],
            Json(outcome.payload),
        )
            .into_response()),
        Err(ProxyError::Provider { status, body }) => {
            let status = if state.config.preserve_upstream_status {
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
            } else {
                StatusCode::OK
            };
            debug!("Returning provider error body with status {status}");
            Ok((
                status,
                [(CACHE_STATUS_HEADER, error_cache_status.as_str())],
                Json(body),
            )
                .into_response())
        }
        Err(other) => Err(other.into()),
    }
}
