//! Seam to the managed auth provider.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && self.expires_at > now
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session refresh failed: {0}")]
    Refresh(String),
}

#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Bearer token of the current session, if any.
    async fn access_token(&self) -> Option<String>;

    /// Tries to obtain a fresh session. `Ok(None)` means there is nothing to refresh.
    async fn refresh(&self) -> Result<Option<Session>, SessionError>;

    /// Drops the session held by this client only. Other devices stay signed in.
    async fn sign_out_local(&self);
}

/// Holds a session handed over by the host and never talks to the auth
/// provider. Refresh succeeds only while the held session is unexpired.
#[derive(Default)]
pub struct LocalSession {
    current: RwLock<Option<Session>>,
}

impl LocalSession {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            current: RwLock::new(session),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionManager for LocalSession {
    async fn access_token(&self) -> Option<String> {
        self.current()
            .filter(|s| s.is_valid_at(Utc::now()))
            .map(|s| s.access_token)
    }

    async fn refresh(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.current().filter(|s| s.is_valid_at(Utc::now())))
    }

    async fn sign_out_local(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
