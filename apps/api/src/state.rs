use std::sync::Arc;

use crate::config::Config;
use crate::proxy::EdgeProxy;
use crate::tools::{PageFetcher, SpeechClient};
use crate::usage::UsageStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub proxy: Arc<EdgeProxy>,
    /// Postgres-backed in production, in-memory when no database is configured.
    pub usage: Arc<dyn UsageStore>,
    pub speech: SpeechClient,
    pub fetcher: PageFetcher,
}
