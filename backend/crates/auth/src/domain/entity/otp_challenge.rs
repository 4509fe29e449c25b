//! OTP Challenge Entity
//!
//! One issued code for one phone. For a given phone at most one challenge
//! is unverified at any time: issuing a new one marks every older unverified
//! challenge as verified (superseded).

use chrono::{DateTime, Duration, Utc};
use kernel::id::ChallengeId;

use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};

#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub challenge_id: ChallengeId,
    /// Canonical phone
    pub phone: Phone,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
    /// Consumed or superseded
    pub verified: bool,
    /// Failed verification attempts while this was the live challenge
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// New unverified challenge expiring `ttl` after `now`
    pub fn issue(phone: Phone, code: OtpCode, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            challenge_id: ChallengeId::new(),
            phone,
            code,
            expires_at: now + ttl,
            verified: false,
            attempts: 0,
            created_at: now,
        }
    }

    /// Unverified and strictly before expiry
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.verified && self.expires_at > now
    }

    /// Whether `candidate` consumes this challenge at `now`
    pub fn accepts(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        self.is_live_at(now) && self.code.matches(candidate)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
