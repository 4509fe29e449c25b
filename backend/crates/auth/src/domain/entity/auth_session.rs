//! Auth Session Entity
//!
//! Server-side session referenced by the signed session cookie.

use chrono::{DateTime, Duration, Utc};
use kernel::id::AccountId;
use uuid::Uuid;

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session ID (UUID v4)
    pub session_id: Uuid,
    pub account_id: AccountId,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(account_id: AccountId, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            account_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at_ms
    }

    /// Update last activity timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Sliding expiry: extend to `now + ttl` once less than half of it remains
    pub fn extend_if_needed(&mut self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.expires_at_ms < (now + (ttl / 2)).timestamp_millis() {
            self.expires_at_ms = (now + ttl).timestamp_millis();
            return true;
        }
        false
    }
}
