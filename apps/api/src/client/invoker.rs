//! Calls an edge function the way the browser SDK does.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::session::SessionManager;

#[derive(Debug, Error)]
pub enum InvokeError {
    /// The function answered with a non-2xx status. `message` is whatever
    /// error text its body carried.
    #[error("Edge Function returned a non-2xx status code")]
    Status { status: u16, message: Option<String> },

    #[error("Failed to send a request to the Edge Function: {0}")]
    Network(String),

    #[error("Edge Function returned a body that is not JSON")]
    Decode,
}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        InvokeError::Network(err.to_string())
    }
}

#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, function: &str, body: &Value) -> Result<Value, InvokeError>;
}

/// Posts JSON to `{functions_url}/{name}` with the session's bearer token,
/// falling back to the project's anonymous key when signed out.
pub struct HttpFunctionInvoker {
    client: Client,
    functions_url: String,
    anon_key: String,
    session: Arc<dyn SessionManager>,
}

impl HttpFunctionInvoker {
    pub fn new(
        client: Client,
        functions_url: impl Into<String>,
        anon_key: impl Into<String>,
        session: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            client,
            functions_url: functions_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session,
        }
    }
}

#[async_trait]
impl FunctionInvoker for HttpFunctionInvoker {
    async fn invoke(&self, function: &str, body: &Value) -> Result<Value, InvokeError> {
        let token = self
            .session
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());

        let response = self
            .client
            .post(format!("{}/{function}", self.functions_url))
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&text);

        if !status.is_success() {
            debug!("Edge function {function} returned {status}");
            return Err(InvokeError::Status {
                status: status.as_u16(),
                message: parsed.ok().as_ref().and_then(body_message),
            });
        }

        parsed.map_err(|_| InvokeError::Decode)
    }
}

/// Error text of a failed function body: `message`, `error.message` or a bare `error` string.
fn body_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.pointer("/error/message"))
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
