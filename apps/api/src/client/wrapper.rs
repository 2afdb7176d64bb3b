//! Caching and retry decorator around edge-function generation calls.
//!
//! Flow per call:
//! 1. a request with a server cache key skips the session cache;
//! 2. otherwise a stored response under the fingerprint key is returned as is;
//! 3. the function is invoked;
//! 4. a non-2xx failure or an auth-looking error triggers one recovery
//!    (refresh, else local sign-out) and exactly one retry;
//! 5. wrapped edge errors and bare provider errors become `{data: null, error}`;
//! 6. a body without candidate text becomes an error;
//! 7. successes are stored, evicting one other entry if storage is full.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::fingerprint::{self, CACHE_PREFIX};
use crate::client::invoker::{FunctionInvoker, InvokeError};
use crate::client::outputs::OutputBundle;
use crate::client::requests::{
    missing_skills_request, parse_missing_skills, tailored_resume_request, TailorInput,
};
use crate::client::session::SessionManager;
use crate::client::storage::{SessionStorage, StorageError};
use crate::client::timeout::{with_timeout, GENERATION_TIMEOUT, SKILLS_TIMEOUT};
use crate::llm_client::payload;
use crate::models::generation::GenerationRequest;

pub const GENERATION_FUNCTION: &str = "gemini-proxy";
pub const NO_RESPONSE_MESSAGE: &str = "No response from AI model. Please try again.";
const EDGE_ERROR_STATUS: &str = "EDGE_ERROR";

static AUTH_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bjwt\b|unauthori[sz]ed|not authenticated",
        r"|\binvalid (?:\w+ )?token\b",
        r"|\b(?:session|token)\b[^.]{0,30}?\b(?:expired|invalid|missing)\b",
    ))
    .expect("auth error pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeFailure {
    pub message: String,
}

/// Uniform result of a wrapped call. Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    pub data: Option<Value>,
    pub error: Option<InvokeFailure>,
}

impl InvokeResult {
    pub fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(InvokeFailure {
                message: message.into(),
            }),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn into_data(self) -> Result<Value, ClientError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(ClientError::Failed(error.message)),
            (None, None) => Err(ClientError::Failed(NO_RESPONSE_MESSAGE.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Failed(String),

    #[error("Could not read the skills list: {0}")]
    MalformedSkills(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct GenerationClient {
    invoker: Arc<dyn FunctionInvoker>,
    session: Arc<dyn SessionManager>,
    storage: Arc<dyn SessionStorage>,
    function: String,
}

impl GenerationClient {
    pub fn new(
        invoker: Arc<dyn FunctionInvoker>,
        session: Arc<dyn SessionManager>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            invoker,
            session,
            storage,
            function: GENERATION_FUNCTION.to_string(),
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub async fn generate(&self, request: &GenerationRequest) -> InvokeResult {
        let body = match serde_json::to_value(request) {
            Ok(body) => body,
            Err(e) => return InvokeResult::failure(e.to_string()),
        };

        // Server-cached requests are not cached twice.
        let cache_key = match request.server_cache_key() {
            Some(_) => None,
            None => Some(fingerprint::cache_key(request)),
        };

        if let Some(key) = &cache_key {
            if let Some(hit) = self.cached(key) {
                debug!("Session cache hit for {key}");
                return InvokeResult::success(hit);
            }
        }

        let mut outcome = self.invoker.invoke(&self.function, &body).await;
        if needs_recovery(&outcome) {
            self.recover().await;
            outcome = self.invoker.invoke(&self.function, &body).await;
        }

        let result = normalize(outcome);
        if let (Some(key), Some(data)) = (&cache_key, &result.data) {
            self.store(key, data);
        }
        result
    }

    /// `generate` bounded by `limit`. A timed-out call keeps running in the background.
    pub async fn generate_within(&self, request: GenerationRequest, limit: Duration) -> InvokeResult {
        let client = self.clone();
        match with_timeout(async move { client.generate(&request).await }, limit).await {
            Ok(result) => result,
            Err(e) => InvokeResult::failure(e.to_string()),
        }
    }

    /// Runs the primary generation and parses the answer into an output bundle.
    pub async fn tailor(&self, input: &TailorInput, today: NaiveDate) -> Result<OutputBundle, ClientError> {
        let request = tailored_resume_request(input, today);
        let data = self
            .generate_within(request, GENERATION_TIMEOUT)
            .await
            .into_data()?;
        let content = payload::candidate_text(&data).unwrap_or_default();

        Ok(OutputBundle::from_generation(
            content,
            &input.resume_text,
            &input.job_text,
        ))
    }

    pub async fn missing_skills(&self, resume_text: &str, job_text: &str) -> Result<Vec<String>, ClientError> {
        let request = missing_skills_request(resume_text, job_text);
        let data = self
            .generate_within(request, SKILLS_TIMEOUT)
            .await
            .into_data()?;

        Ok(parse_missing_skills(
            payload::candidate_text(&data).unwrap_or_default(),
        )?)
    }

    async fn recover(&self) {
        match self.session.refresh().await {
            Ok(Some(session)) if session.is_valid_at(Utc::now()) => {
                info!("Session refreshed, retrying generation")
            }
            Ok(_) => {
                info!("No valid session after refresh, signing out locally before retry");
                self.session.sign_out_local().await;
            }
            Err(e) => {
                warn!("{e}, signing out locally before retry");
                self.session.sign_out_local().await;
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get(key)?;
        serde_json::from_str(&raw).ok()
    }

    /// Never fails: storage problems are logged and the response is simply not cached.
    fn store(&self, key: &str, data: &Value) {
        let raw = data.to_string();
        match self.storage.set(key, &raw) {
            Ok(()) => debug!("Stored session cache entry {key}"),
            Err(StorageError::QuotaExceeded) => {
                let victim = self
                    .storage
                    .keys()
                    .into_iter()
                    .find(|k| k.starts_with(CACHE_PREFIX) && k != key);
                if let Some(victim) = victim {
                    debug!("Session storage full, evicting {victim}");
                    self.storage.remove(&victim);
                }
                if let Err(e) = self.storage.set(key, &raw) {
                    warn!("Could not cache response under {key}: {e}");
                }
            }
            Err(e) => warn!("Could not cache response under {key}: {e}"),
        }
    }
}

fn needs_recovery(outcome: &Result<Value, InvokeError>) -> bool {
    match outcome {
        Err(InvokeError::Status { .. }) => true,
        Err(e) => AUTH_ERROR.is_match(&e.to_string()),
        Ok(body) => embedded_error(body).is_some_and(|m| AUTH_ERROR.is_match(&m)),
    }
}

/// Error text carried inside a 2xx body, if any.
fn embedded_error(body: &Value) -> Option<String> {
    if let Some(error) = body.get("error").filter(|e| e.is_object()) {
        if error.get("status").and_then(Value::as_str) == Some(EDGE_ERROR_STATUS) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Edge function error");
            return Some(message.to_string());
        }
    }

    let wrapped_status = body
        .get("code")
        .or_else(|| body.get("status"))
        .and_then(Value::as_u64)
        .filter(|status| *status >= 400);
    if wrapped_status.is_some() {
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }

    if payload::has_error(body) {
        let message = payload::error_message(body).unwrap_or("Unknown provider error");
        return Some(message.to_string());
    }
    None
}

fn normalize(outcome: Result<Value, InvokeError>) -> InvokeResult {
    let body = match outcome {
        Ok(body) => body,
        Err(e) => return InvokeResult::failure(e.to_string()),
    };

    if let Some(message) = embedded_error(&body) {
        return InvokeResult::failure(message);
    }

    if payload::candidate_text(&body).is_none() {
        let reason = payload::block_reason(&body)
            .or_else(|| payload::finish_reason(&body))
            .unwrap_or(NO_RESPONSE_MESSAGE);
        return InvokeResult::failure(reason);
    }

    InvokeResult::success(body)
}
