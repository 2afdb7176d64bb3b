//! Axum route handlers for the usage gate.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::usage::{evaluate, QuotaDecision};

const MAX_TOOL_NAME_LEN: usize = 64;

#[derive(Debug, Serialize)]
pub struct UsageStatusResponse {
    pub allowed: bool,
    #[serde(flatten)]
    pub decision: QuotaDecision,
}

#[derive(Debug, Serialize)]
pub struct IncrementResponse {
    pub generation_count: i32,
}

#[derive(Debug, Serialize)]
pub struct TeaserResponse {
    pub granted: bool,
}

/// GET /api/v1/usage/:user_id
///
/// Decides whether the user may start another generation, applying the
/// monthly reset when one is due.
pub async fn handle_usage_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UsageStatusResponse>, AppError> {
    let now = Utc::now();
    let profile = state.usage.fetch_profile(user_id).await?;
    let decision = evaluate(
        profile.as_ref(),
        now,
        state.config.free_monthly_generations,
    );

    if decision == QuotaDecision::AllowedAfterReset {
        info!("Resetting monthly generation count for user {user_id}");
        state.usage.reset(user_id, now).await?;
    }

    Ok(Json(UsageStatusResponse {
        allowed: decision.is_allowed(),
        decision,
    }))
}

/// POST /api/v1/usage/:user_id/increment
pub async fn handle_increment(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<IncrementResponse>, AppError> {
    let generation_count = state
        .usage
        .increment(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No usage profile for user {user_id}")))?;

    Ok(Json(IncrementResponse { generation_count }))
}

/// POST /api/v1/usage/:user_id/teaser/:tool
///
/// Grants the single free use of a tool. Later calls for the same tool are refused.
pub async fn handle_claim_teaser(
    State(state): State<AppState>,
    Path((user_id, tool)): Path<(Uuid, String)>,
) -> Result<Json<TeaserResponse>, AppError> {
    let tool = tool.trim();
    if tool.is_empty() || tool.len() > MAX_TOOL_NAME_LEN {
        return Err(AppError::Validation(format!(
            "tool must be 1 to {MAX_TOOL_NAME_LEN} characters"
        )));
    }

    let granted = state.usage.claim_teaser(user_id, tool).await?;
    info!("Teaser for tool {tool} requested by user {user_id}: granted={granted}");

    Ok(Json(TeaserResponse { granted }))
}
