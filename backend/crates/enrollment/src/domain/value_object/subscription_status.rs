//! Subscription Status
//!
//! Status values written by the payment collaborator and the expiry sweep.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[display("active")]
    Active,
    #[display("trialing")]
    Trialing,
    /// Payment retry in progress; still grants access
    #[display("past_due")]
    PastDue,
    #[display("canceled")]
    Canceled,
    #[display("incomplete")]
    Incomplete,
    /// No subscription record
    #[display("none")]
    None,
}

impl SubscriptionStatus {
    /// Statuses that may still be demoted by the expiry sweep
    pub const ACCESS_GRANTING: [SubscriptionStatus; 3] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Trialing,
        SubscriptionStatus::PastDue,
    ];

    /// Parse a processor status. Anything unrecognised (e.g. `unpaid`,
    /// `incomplete_expired`, `paused`) is treated as `incomplete`, which
    /// never grants access.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" | "cancelled" => Self::Canceled,
            "none" | "" => Self::None,
            _ => Self::Incomplete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::None => "none",
        }
    }

    #[inline]
    pub fn grants_access(&self) -> bool {
        Self::ACCESS_GRANTING.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_granting_set() {
        assert!(SubscriptionStatus::Active.grants_access());
        assert!(SubscriptionStatus::Trialing.grants_access());
        assert!(SubscriptionStatus::PastDue.grants_access());
        assert!(!SubscriptionStatus::Canceled.grants_access());
        assert!(!SubscriptionStatus::Incomplete.grants_access());
        assert!(!SubscriptionStatus::None.grants_access());
    }

    #[test]
    fn test_parse_and_display_agree() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::None,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_unknown_status_never_grants_access() {
        assert_eq!(SubscriptionStatus::parse("unpaid"), SubscriptionStatus::Incomplete);
        assert_eq!(
            SubscriptionStatus::parse("incomplete_expired"),
            SubscriptionStatus::Incomplete
        );
        assert_eq!(SubscriptionStatus::parse(" PAST_DUE "), SubscriptionStatus::PastDue);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }
}
