//! Server-side response cache: a shared key-value table with per-entry expiry.
//!
//! Entries are never mutated in place. A write for an existing key replaces it
//! (last write wins) and expiry is checked at lookup time, never swept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCacheStore;
pub use postgres::PgCacheStore;

/// Default time-to-live for a cached response: 24 hours.
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub cache_key: String,
    pub cache_value: Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value if an entry exists and has not expired.
    async fn lookup(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Inserts or replaces the entry for `entry.cache_key`.
    async fn upsert(&self, entry: CacheEntry) -> Result<(), CacheError>;
}
