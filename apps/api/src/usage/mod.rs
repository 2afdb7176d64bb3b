// Usage / tier gate: monthly generation counter and one-time teaser flags.
// Checked before a generation is started; never consulted by the proxy itself.

pub mod handlers;
pub mod policy;
pub mod store;

use thiserror::Error;

pub use policy::{evaluate, QuotaDecision};
pub use store::{MemoryUsageStore, PgUsageStore, UsageStore};

/// Generations per calendar month on the free plan.
pub const DEFAULT_FREE_MONTHLY_GENERATIONS: i32 = 5;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
