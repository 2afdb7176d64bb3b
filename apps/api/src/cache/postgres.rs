use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{CacheEntry, CacheError, CacheStore};

/// `llm_cache` table backed store.
#[derive(Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn lookup(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(sqlx::query_scalar::<_, Value>(
            "SELECT cache_value FROM llm_cache WHERE cache_key = $1 AND expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            INSERT INTO llm_cache (cache_key, cache_value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (cache_key)
            DO UPDATE SET cache_value = EXCLUDED.cache_value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&entry.cache_key)
        .bind(&entry.cache_value)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
