//! Access Gate
//!
//! Pure derivation of "may use gated features" from the latest
//! subscription record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entity::subscription::Subscription;
use crate::domain::value_object::subscription_status::SubscriptionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub status: SubscriptionStatus,
    pub has_access: bool,
    /// Period end, for UI messaging only
    pub access_until: Option<DateTime<Utc>>,
}

/// `has_access` iff status is active, trialing or past_due.
/// No record maps to status `none`.
pub fn evaluate(subscription: Option<&Subscription>) -> AccessDecision {
    match subscription {
        Some(sub) => AccessDecision {
            status: sub.status,
            has_access: sub.status.grants_access(),
            access_until: sub.period_end,
        },
        None => AccessDecision {
            status: SubscriptionStatus::None,
            has_access: false,
            access_until: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::AccountId;

    fn record(status: SubscriptionStatus) -> Subscription {
        let now = Utc::now();
        Subscription::new(AccountId::new(), status, Some(now + chrono::Duration::days(30)), now)
    }

    #[test]
    fn test_absent_record() {
        let decision = evaluate(None);
        assert_eq!(decision.status, SubscriptionStatus::None);
        assert!(!decision.has_access);
        assert!(decision.access_until.is_none());
    }

    #[test]
    fn test_past_due_keeps_access() {
        let sub = record(SubscriptionStatus::PastDue);
        let decision = evaluate(Some(&sub));
        assert!(decision.has_access);
        assert_eq!(decision.access_until, sub.period_end);
    }

    #[test]
    fn test_canceled_and_incomplete_deny() {
        assert!(!evaluate(Some(&record(SubscriptionStatus::Canceled))).has_access);
        assert!(!evaluate(Some(&record(SubscriptionStatus::Incomplete))).has_access);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(evaluate(Some(&record(SubscriptionStatus::Trialing)))).unwrap();
        assert_eq!(json["status"], "trialing");
        assert_eq!(json["hasAccess"], true);
        assert!(json["accessUntil"].is_string());
    }
}
