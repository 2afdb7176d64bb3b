//! Session-scoped key/value storage used by the client wrapper.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String storage that lives as long as the user's session.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
    /// Keys in storage order.
    fn keys(&self) -> Vec<String>;
}

/// In-process storage with a byte quota over keys and values.
pub struct MemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: usize,
}

impl MemorySessionStorage {
    /// Browsers give session storage roughly 5 MB per origin.
    pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

    pub fn new() -> Self {
        Self::with_quota(Self::DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock();
        let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
        let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
        if used - replaced + key.len() + value.len() > self.quota_bytes {
            return Err(StorageError::QuotaExceeded);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemorySessionStorage::new();
        assert!(storage.is_empty());
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").as_deref(), Some("1"));
        storage.remove("a");
        assert_eq!(storage.get("a"), None);
    }

    #[test]
    fn test_quota_counts_keys_and_values() {
        let storage = MemorySessionStorage::with_quota(10);
        storage.set("k1", "1234").unwrap();
        assert_eq!(storage.used_bytes(), 6);
        assert_eq!(storage.set("k2", "12345"), Err(StorageError::QuotaExceeded));
        assert_eq!(storage.get("k2"), None);
        storage.set("k2", "12").unwrap();
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_overwrite_frees_the_old_value() {
        let storage = MemorySessionStorage::with_quota(10);
        storage.set("k", "12345678").unwrap();
        storage.set("k", "abcdefgh").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("abcdefgh"));
    }
}
