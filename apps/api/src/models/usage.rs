use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PLAN_FREE: &str = "free";
pub const PLAN_PREMIUM: &str = "premium";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageProfile {
    pub user_id: Uuid,
    pub plan: String,
    pub generation_count: i32,
    pub generation_reset_at: DateTime<Utc>,
}

impl UsageProfile {
    pub fn is_premium(&self) -> bool {
        self.plan == PLAN_PREMIUM
    }
}
