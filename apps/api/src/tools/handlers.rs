//! Axum route handlers for the tool edge functions.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;
use crate::tools::{FetchError, SpeechError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody {
    #[serde(default)]
    pub text: String,
    pub voice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FetchUrlBody {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FetchUrlResponse {
    pub html: String,
}

/// POST /functions/v1/elevenlabs-tts
pub async fn handle_tts(
    State(state): State<AppState>,
    body: Result<Json<SpeechBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let audio = state
        .speech
        .synthesize(&body.text, body.voice_id.as_deref())
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], audio).into_response())
}

/// POST /functions/v1/fetch-url
pub async fn handle_fetch_url(
    State(state): State<AppState>,
    body: Result<Json<FetchUrlBody>, JsonRejection>,
) -> Result<Json<FetchUrlResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let html = state.fetcher.fetch_html(&body.url).await?;
    Ok(Json(FetchUrlResponse { html }))
}

impl From<SpeechError> for AppError {
    fn from(err: SpeechError) -> Self {
        let message = err.to_string();
        match err {
            SpeechError::NotConfigured => AppError::Configuration(message),
            SpeechError::EmptyText => AppError::Validation(message),
            SpeechError::Http(_) | SpeechError::Api { .. } => AppError::Upstream(message),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        if err.is_client_error() {
            AppError::Validation(err.to_string())
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}
