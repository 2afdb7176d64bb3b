/// LLM Client: the single point of entry for every provider call made by the proxy.
///
/// The provider is Google's Gemini `generateContent` API. Requests are forwarded
/// verbatim apart from the model id, which becomes part of the URL, and the API
/// key, which is held server-side and never accepted from callers.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::generation::ProviderRequest;

pub mod payload;
pub mod prompts;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("GEMINI_API_KEY environment variable is not defined")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned a non-JSON body (status {status})")]
    Parse { status: u16 },

    /// Error reported by the provider. `body` is its raw JSON, kept so callers
    /// can hand it back untouched.
    #[error("API error (status {status}): {}", payload::error_message(.body).unwrap_or("unknown error"))]
    Api { status: u16, body: Value },
}

/// The generation backend seen by the proxy.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// False when the server-held credential is missing.
    fn is_configured(&self) -> bool;

    async fn generate_content(
        &self,
        model: &str,
        request: &ProviderRequest<'_>,
    ) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Single attempt, no retry: the client wrapper owns retry policy.
    async fn generate_content(
        &self,
        model: &str,
        request: &ProviderRequest<'_>,
    ) -> Result<Value, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            warn!("Provider returned unparsable body ({status}): {e}");
            ProviderError::Parse {
                status: status.as_u16(),
            }
        })?;

        if !status.is_success() || payload::has_error(&body) {
            warn!(
                "Provider reported an error for model {model} ({status}): {}",
                payload::error_message(&body).unwrap_or("no message")
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "Provider call succeeded: model={model}, candidates={}",
            payload::candidate_count(&body)
        );

        Ok(body)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
