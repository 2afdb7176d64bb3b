//! Edge proxy: forwards a generation request to the provider, optionally
//! serving and storing the response through the shared cache table.
//!
//! Flow: credential check → cache lookup (only with a cache key) → provider
//! call → cache upsert (only for candidate-bearing responses).
//!
//! Cache failures never fail a request. A lookup error counts as a miss and a
//! write error is logged and dropped.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::llm_client::{payload, GenerationProvider, ProviderError};
use crate::models::generation::{GenerationRequest, ProviderRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache table; the provider was not called.
    Hit,
    /// A cache key was supplied but no live entry existed.
    Miss,
    /// No cache key; the cache was not consulted.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

#[derive(Debug)]
pub struct ProxyOutcome {
    pub payload: Value,
    pub cache: CacheStatus,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("GEMINI_API_KEY environment variable is not defined")]
    NotConfigured,

    /// The provider answered with an error. `body` is its raw JSON.
    #[error("Provider error (status {status})")]
    Provider { status: u16, body: Value },

    #[error("Provider unreachable: {0}")]
    Upstream(String),
}

impl From<ProviderError> for ProxyError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured => ProxyError::NotConfigured,
            ProviderError::Api { status, body } => ProxyError::Provider { status, body },
            other => ProxyError::Upstream(other.to_string()),
        }
    }
}

pub struct EdgeProxy {
    provider: Arc<dyn GenerationProvider>,
    cache: Arc<dyn CacheStore>,
    default_model: String,
    default_ttl: Duration,
}

impl EdgeProxy {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        cache: Arc<dyn CacheStore>,
        default_model: impl Into<String>,
        default_ttl_secs: u64,
    ) -> Self {
        Self {
            provider,
            cache,
            default_model: default_model.into(),
            default_ttl: ttl_from_secs(default_ttl_secs),
        }
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ProxyOutcome, ProxyError> {
        if !self.provider.is_configured() {
            return Err(ProxyError::NotConfigured);
        }

        let cache_key = request.server_cache_key();
        if let Some(key) = cache_key {
            match self.cache.lookup(key).await {
                Ok(Some(payload)) => {
                    info!("Cache HIT for key {key}");
                    return Ok(ProxyOutcome {
                        payload,
                        cache: CacheStatus::Hit,
                    });
                }
                Ok(None) => debug!("Cache MISS for key {key}"),
                Err(e) => warn!("Cache lookup failed for key {key}, treating as miss: {e}"),
            }
        }

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);

        let payload = self
            .provider
            .generate_content(model, &ProviderRequest::from(&request))
            .await?;

        if let Some(key) = cache_key {
            if payload::has_candidates(&payload) {
                let ttl = request
                    .cache_ttl_seconds
                    .map(ttl_from_secs)
                    .unwrap_or(self.default_ttl);
                self.store(key, &payload, ttl).await;
            } else {
                debug!("Not caching response without candidates for key {key}");
            }
        }

        Ok(ProxyOutcome {
            payload,
            cache: if cache_key.is_some() {
                CacheStatus::Miss
            } else {
                CacheStatus::Bypass
            },
        })
    }

    async fn store(&self, key: &str, payload: &Value, ttl: Duration) {
        let entry = CacheEntry {
            cache_key: key.to_string(),
            cache_value: payload.clone(),
            expires_at: Utc::now() + ttl,
        };
        match self.cache.upsert(entry).await {
            Ok(()) => debug!("Cached response for key {key} ({}s)", ttl.num_seconds()),
            Err(e) => warn!("Cache write failed for key {key}: {e}"),
        }
    }
}

/// Longest accepted time-to-live; larger requests are clamped.
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

fn ttl_from_secs(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}
