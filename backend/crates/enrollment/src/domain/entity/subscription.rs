//! Subscription Record
//!
//! Mirror of the payment processor's subscription state for one account.
//! The most recently created record of an account is authoritative.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, SubscriptionId};

use crate::domain::value_object::subscription_status::SubscriptionStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub subscription_id: SubscriptionId,
    pub account_id: AccountId,
    /// Processor customer reference
    pub customer_ref: Option<String>,
    /// Processor subscription reference
    pub subscription_ref: Option<String>,
    pub status: SubscriptionStatus,
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        account_id: AccountId,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            subscription_id: SubscriptionId::new(),
            account_id,
            customer_ref: None,
            subscription_ref: None,
            status,
            period_end,
            created_at: now,
            updated_at: now,
        }
    }

    /// Access-granting status with a period end strictly before `now`
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.status.grants_access() && self.period_end.is_some_and(|end| end < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lapsed_requires_period_end_in_past() {
        let now = Utc::now();
        let account = AccountId::new();

        let open_ended = Subscription::new(account, SubscriptionStatus::Active, None, now);
        assert!(!open_ended.is_lapsed_at(now));

        let past = Subscription::new(
            account,
            SubscriptionStatus::PastDue,
            Some(now - chrono::Duration::days(1)),
            now,
        );
        assert!(past.is_lapsed_at(now));

        let canceled = Subscription::new(
            account,
            SubscriptionStatus::Canceled,
            Some(now - chrono::Duration::days(1)),
            now,
        );
        assert!(!canceled.is_lapsed_at(now));

        let boundary = Subscription::new(account, SubscriptionStatus::Active, Some(now), now);
        assert!(!boundary.is_lapsed_at(now));
    }
}
