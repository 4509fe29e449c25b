//! Account Entity
//!
//! Exactly one account per canonical phone. The stored credential is the
//! Argon2id hash of the derived credential; the user never sees or types it.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::credential::CredentialHash;

use crate::domain::value_object::phone::Phone;

#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: AccountId,
    /// Canonical phone (unique)
    pub phone: Phone,
    pub credential_hash: CredentialHash,
    /// Identity-store confirmation flag, re-applied on every login
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create an account for a phone that just passed OTP verification
    pub fn register(phone: Phone, credential_hash: CredentialHash, now: DateTime<Utc>) -> Self {
        Self {
            account_id: AccountId::new(),
            phone,
            credential_hash,
            confirmed: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Unconditionally re-apply credential and confirmation
    pub fn refresh_credential(&mut self, credential_hash: CredentialHash, now: DateTime<Utc>) {
        self.credential_hash = credential_hash;
        self.confirmed = true;
        self.updated_at = now;
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}
