//! In-Memory Repository
//!
//! Implements every auth repository trait over a single async mutex. One
//! lock acquisition stands in for one database transaction, so `issue` and
//! `verify` have the same atomicity as the Postgres adapter. Used by tests
//! and local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{account::Account, auth_session::AuthSession, otp_challenge::OtpChallenge};
use crate::domain::repository::{
    AccountRepository, AuthSessionRepository, CreateAccount, OtpChallengeRepository,
};
use crate::domain::value_object::phone::Phone;
use crate::error::AuthResult;

#[derive(Default)]
struct State {
    /// Insertion order doubles as the `seq` tie-break
    challenges: Vec<OtpChallenge>,
    accounts: HashMap<AccountId, Account>,
    sessions: HashMap<Uuid, AuthSession>,
    rate_limits: HashMap<(String, i64), u32>,
}

impl State {
    /// Index of the latest unverified challenge for `phone`
    fn latest_unverified(&self, phone: &Phone) -> Option<usize> {
        self.challenges
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.phone == phone && !c.verified)
            .max_by_key(|(seq, c)| (c.created_at, *seq))
            .map(|(seq, _)| seq)
    }
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All challenges for a phone, oldest first (inspection in tests)
    pub async fn challenges_for(&self, phone: &Phone) -> Vec<OtpChallenge> {
        let state = self.state.lock().await;
        state
            .challenges
            .iter()
            .filter(|c| &c.phone == phone)
            .cloned()
            .collect()
    }

    pub async fn account_count(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

impl OtpChallengeRepository for MemoryAuthRepository {
    async fn issue(&self, challenge: &OtpChallenge) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        for existing in state
            .challenges
            .iter_mut()
            .filter(|c| c.phone == challenge.phone && !c.verified)
        {
            existing.verified = true;
        }
        state.challenges.push(challenge.clone());
        Ok(())
    }

    async fn verify(&self, phone: &Phone, code: &str, now: DateTime<Utc>) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let Some(index) = state.latest_unverified(phone) else {
            return Ok(false);
        };

        let challenge = &mut state.challenges[index];
        if challenge.accepts(code, now) {
            challenge.verified = true;
            Ok(true)
        } else {
            challenge.attempts += 1;
            Ok(false)
        }
    }

    async fn find_latest_unverified(&self, phone: &Phone) -> AuthResult<Option<OtpChallenge>> {
        let state = self.state.lock().await;
        Ok(state
            .latest_unverified(phone)
            .map(|index| state.challenges[index].clone()))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.challenges.len();
        state.challenges.retain(|c| !c.is_expired_at(now));
        Ok((before - state.challenges.len()) as u64)
    }
}

impl AccountRepository for MemoryAuthRepository {
    async fn create_account(&self, account: &Account) -> AuthResult<CreateAccount> {
        let mut state = self.state.lock().await;
        if state.accounts.values().any(|a| a.phone == account.phone) {
            return Ok(CreateAccount::AlreadyExists);
        }
        state.accounts.insert(account.account_id, account.clone());
        Ok(CreateAccount::Created)
    }

    async fn find_account_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().find(|a| &a.phone == phone).cloned())
    }

    async fn update_account(&self, account: &Account) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.accounts.get_mut(&account.account_id) {
            *existing = account.clone();
        }
        Ok(())
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        Ok(self.state.lock().await.sessions.get(&session_id).cloned())
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.sessions.get_mut(&session.session_id) {
            *existing = session.clone();
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.state.lock().await.sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

impl RateLimitStore for MemoryAuthRepository {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().await;
        let window_start = config.window_start_ms(now_ms);
        let count = state
            .rate_limits
            .entry((key.to_string(), window_start))
            .or_insert(0);
        *count += 1;
        Ok(config.evaluate(*count, now_ms))
    }
}
