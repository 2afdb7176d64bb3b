//! Quota decision for the monthly generation counter.
//!
//! Pure function of the stored profile and the current time so the rules can
//! be tested without a database. The caller applies a reset when asked to.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::models::usage::UsageProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    /// No profile row yet; anonymous and first-time users are not gated.
    NoProfile,
    Unlimited,
    /// At least one calendar month since the last reset; the counter must be zeroed.
    AllowedAfterReset,
    Allowed { used: i32, limit: i32 },
    Denied { used: i32, limit: i32 },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, QuotaDecision::Denied { .. })
    }
}

pub fn evaluate(profile: Option<&UsageProfile>, now: DateTime<Utc>, limit: i32) -> QuotaDecision {
    let Some(profile) = profile else {
        return QuotaDecision::NoProfile;
    };

    if profile.is_premium() {
        return QuotaDecision::Unlimited;
    }

    if months_between(profile.generation_reset_at, now) >= 1 {
        return QuotaDecision::AllowedAfterReset;
    }

    let used = profile.generation_count;
    if used >= limit {
        QuotaDecision::Denied { used, limit }
    } else {
        QuotaDecision::Allowed { used, limit }
    }
}

/// Calendar months between two instants, ignoring the day of month.
fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage::{PLAN_FREE, PLAN_PREMIUM};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn profile(plan: &str, count: i32, reset_at: DateTime<Utc>) -> UsageProfile {
        UsageProfile {
            user_id: Uuid::new_v4(),
            plan: plan.to_string(),
            generation_count: count,
            generation_reset_at: reset_at,
        }
    }

    #[test]
    fn test_missing_profile_is_allowed() {
        assert_eq!(evaluate(None, at(2025, 3, 1), 5), QuotaDecision::NoProfile);
    }

    #[test]
    fn test_premium_is_unlimited() {
        let p = profile(PLAN_PREMIUM, 500, at(2025, 3, 1));
        assert_eq!(evaluate(Some(&p), at(2025, 3, 20), 5), QuotaDecision::Unlimited);
    }

    #[test]
    fn test_free_under_limit_is_allowed() {
        let p = profile(PLAN_FREE, 4, at(2025, 3, 1));
        assert_eq!(
            evaluate(Some(&p), at(2025, 3, 31), 5),
            QuotaDecision::Allowed { used: 4, limit: 5 }
        );
    }

    #[test]
    fn test_free_at_limit_is_denied() {
        let p = profile(PLAN_FREE, 5, at(2025, 3, 1));
        let decision = evaluate(Some(&p), at(2025, 3, 31), 5);
        assert_eq!(decision, QuotaDecision::Denied { used: 5, limit: 5 });
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_new_calendar_month_resets_even_after_one_day() {
        let p = profile(PLAN_FREE, 5, at(2025, 3, 31));
        assert_eq!(evaluate(Some(&p), at(2025, 4, 1), 5), QuotaDecision::AllowedAfterReset);
    }

    #[test]
    fn test_year_boundary_counts_as_new_month() {
        let p = profile(PLAN_FREE, 9, at(2024, 12, 15));
        assert_eq!(evaluate(Some(&p), at(2025, 1, 2), 5), QuotaDecision::AllowedAfterReset);
    }
}
