//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer (`infra::postgres`, `infra::memory`).

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::rate_limit::RateLimitStore;
use uuid::Uuid;

use crate::domain::entity::{account::Account, auth_session::AuthSession, otp_challenge::OtpChallenge};
use crate::domain::value_object::phone::Phone;
use crate::error::AuthResult;

/// OTP store
///
/// `issue` and `verify` must behave as if serialized per phone.
#[trait_variant::make(OtpChallengeRepository: Send)]
pub trait LocalOtpChallengeRepository {
    /// Mark every unverified challenge for the phone as verified, then insert
    /// `challenge`. Atomic: either both happen or neither.
    async fn issue(&self, challenge: &OtpChallenge) -> AuthResult<()>;

    /// Consume the latest unverified challenge if `code` matches and it has
    /// not expired at `now`. Otherwise bump that challenge's `attempts`
    /// (when one exists) and return false.
    async fn verify(&self, phone: &Phone, code: &str, now: DateTime<Utc>) -> AuthResult<bool>;

    /// Latest unverified challenge for the phone, expired or not
    async fn find_latest_unverified(&self, phone: &Phone) -> AuthResult<Option<OtpChallenge>>;

    /// Delete challenges whose expiry is at or before `now`
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Result of an account insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAccount {
    Created,
    /// Another request registered the phone first
    AlreadyExists,
}

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert unless an account with the same phone exists
    async fn create_account(&self, account: &Account) -> AuthResult<CreateAccount>;

    async fn find_account_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>>;

    async fn update_account(&self, account: &Account) -> AuthResult<()>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>>;

    /// Update session (last activity, sliding expiry)
    async fn update_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    /// Delete sessions expired at `now`
    async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Everything the auth HTTP surface needs from one store
pub trait AuthStore:
    OtpChallengeRepository
    + AccountRepository
    + AuthSessionRepository
    + RateLimitStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: OtpChallengeRepository
        + AccountRepository
        + AuthSessionRepository
        + RateLimitStore
        + Clone
        + Send
        + Sync
        + 'static
{
}
