use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::UsageError;
use crate::models::usage::UsageProfile;

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UsageProfile>, UsageError>;

    /// Zeroes the monthly counter and stamps the reset time.
    async fn reset(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), UsageError>;

    /// Adds one generation. Returns the new count, or `None` without a profile row.
    async fn increment(&self, user_id: Uuid) -> Result<Option<i32>, UsageError>;

    /// Spends the one free use of `tool`. True only the first time.
    async fn claim_teaser(&self, user_id: Uuid, tool: &str) -> Result<bool, UsageError>;
}

#[derive(Clone)]
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UsageProfile>, UsageError> {
        Ok(sqlx::query_as::<_, UsageProfile>(
            r#"
            SELECT user_id, plan, generation_count, generation_reset_at
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn reset(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), UsageError> {
        sqlx::query(
            "UPDATE user_profiles SET generation_count = 0, generation_reset_at = $2 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment(&self, user_id: Uuid) -> Result<Option<i32>, UsageError> {
        Ok(sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE user_profiles
            SET generation_count = generation_count + 1
            WHERE user_id = $1
            RETURNING generation_count
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn claim_teaser(&self, user_id: Uuid, tool: &str) -> Result<bool, UsageError> {
        let result = sqlx::query(
            "INSERT INTO tool_teasers (user_id, tool) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(tool)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryUsageStore {
    profiles: Mutex<HashMap<Uuid, UsageProfile>>,
    teasers: Mutex<HashSet<(Uuid, String)>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: UsageProfile) {
        self.profiles.lock().await.insert(profile.user_id, profile);
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UsageProfile>, UsageError> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn reset(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), UsageError> {
        if let Some(profile) = self.profiles.lock().await.get_mut(&user_id) {
            profile.generation_count = 0;
            profile.generation_reset_at = now;
        }
        Ok(())
    }

    async fn increment(&self, user_id: Uuid) -> Result<Option<i32>, UsageError> {
        Ok(self.profiles.lock().await.get_mut(&user_id).map(|profile| {
            profile.generation_count += 1;
            profile.generation_count
        }))
    }

    async fn claim_teaser(&self, user_id: Uuid, tool: &str) -> Result<bool, UsageError> {
        Ok(self.teasers.lock().await.insert((user_id, tool.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage::PLAN_FREE;

    #[tokio::test]
    async fn test_increment_without_profile_returns_none() {
        let store = MemoryUsageStore::new();
        assert_eq!(store.increment(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_and_reset() {
        let store = MemoryUsageStore::new();
        let user_id = Uuid::new_v4();
        store
            .insert_profile(UsageProfile {
                user_id,
                plan: PLAN_FREE.to_string(),
                generation_count: 2,
                generation_reset_at: Utc::now(),
            })
            .await;

        assert_eq!(store.increment(user_id).await.unwrap(), Some(3));
        let now = Utc::now();
        store.reset(user_id, now).await.unwrap();
        let profile = store.fetch_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.generation_count, 0);
        assert_eq!(profile.generation_reset_at, now);
    }

    #[tokio::test]
    async fn test_teaser_is_granted_once_per_tool() {
        let store = MemoryUsageStore::new();
        let user_id = Uuid::new_v4();
        assert!(store.claim_teaser(user_id, "linkedin").await.unwrap());
        assert!(!store.claim_teaser(user_id, "linkedin").await.unwrap());
        assert!(store.claim_teaser(user_id, "cover-letter").await.unwrap());
    }
}
