use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{CacheEntry, CacheError, CacheStore};

/// Process-local store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw entry, expired or not.
    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Utc::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.cache_value.clone()))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(entry.cache_key.clone(), entry);
        Ok(())
    }
}
