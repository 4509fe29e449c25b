//! Identity Binder
//!
//! Maps a phone that just passed OTP verification to its account, creating
//! it on first login, and establishes a session.
//!
//! The derived credential (keyed hash of the phone) is the authentication
//! secret of the login transaction: it is re-derived, re-applied to the
//! account, then verified against the stored hash before the session row is
//! written. The user never sees it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::credential::{CredentialHash, DerivedCredential};

use crate::application::config::AuthConfig;
use crate::application::session_token::create_session_token;
use crate::domain::entity::{account::Account, auth_session::AuthSession};
use crate::domain::notifier::Notifier;
use crate::domain::repository::{AccountRepository, AuthSessionRepository, CreateAccount};
use crate::domain::value_object::phone::Phone;
use crate::error::{AuthError, AuthResult};

/// Outcome of a successful binding
#[derive(Debug, Clone)]
pub struct BindingOutput {
    pub account_id: AccountId,
    pub is_new_user: bool,
    /// Signed session cookie value
    pub session_token: String,
    pub session_expires_at_ms: i64,
}

pub struct IdentityBinder<R, N>
where
    R: AccountRepository + AuthSessionRepository,
    N: Notifier + Send + Sync + 'static,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<R, N> IdentityBinder<R, N>
where
    R: AccountRepository + AuthSessionRepository,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Precondition: `phone` has just passed OTP verification.
    pub async fn login_or_register(&self, phone: &Phone) -> AuthResult<BindingOutput> {
        let now = Utc::now();
        let (account, is_new_user) = self.bind_account(phone, now).await?;

        if is_new_user {
            tracing::info!(account_id = %account.account_id, phone = %phone.masked(), "Account created");
            self.send_welcome(phone);
        }

        // From here on the account exists; failures are reported distinctly.
        let session = self.establish_session(&account, now).await?;

        tracing::info!(
            account_id = %account.account_id,
            is_new_user = is_new_user,
            "Signed in"
        );

        Ok(BindingOutput {
            account_id: account.account_id,
            is_new_user,
            session_token: create_session_token(&self.config.session_secret, session.session_id),
            session_expires_at_ms: session.expires_at_ms,
        })
    }

    async fn bind_account(&self, phone: &Phone, now: DateTime<Utc>) -> AuthResult<(Account, bool)> {
        if let Some(account) = self.repo.find_account_by_phone(phone).await? {
            return Ok((self.refresh(account, now).await?, false));
        }

        let mut account = Account::register(phone.clone(), self.hash_credential(phone).await?, now);
        account.record_login(now);

        match self.repo.create_account(&account).await? {
            CreateAccount::Created => Ok((account, true)),
            CreateAccount::AlreadyExists => {
                // Lost a registration race for the same phone; bind to the winner.
                tracing::debug!(phone = %phone.masked(), "Concurrent registration, re-reading account");
                let existing = self
                    .repo
                    .find_account_by_phone(phone)
                    .await?
                    .ok_or_else(|| AuthError::Internal("Account vanished after conflict".into()))?;
                Ok((self.refresh(existing, now).await?, false))
            }
        }
    }

    /// Re-apply credential and confirmation unconditionally
    async fn refresh(&self, mut account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        let hash = self.hash_credential(&account.phone).await?;
        account.refresh_credential(hash, now);
        account.record_login(now);
        self.repo.update_account(&account).await?;
        Ok(account)
    }

    async fn hash_credential(&self, phone: &Phone) -> AuthResult<CredentialHash> {
        let config = self.config.clone();
        let phone = phone.as_str().to_string();

        tokio::task::spawn_blocking(move || {
            DerivedCredential::derive(&config.credential_secret, &phone)?.hash(config.pepper())
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Credential task failed: {e}")))?
        .map_err(AuthError::from)
    }

    async fn establish_session(&self, account: &Account, now: DateTime<Utc>) -> AuthResult<AuthSession> {
        let config = self.config.clone();
        let phone = account.phone.as_str().to_string();
        let stored = account.credential_hash.clone();

        let authenticated = tokio::task::spawn_blocking(move || {
            DerivedCredential::derive(&config.credential_secret, &phone)
                .map(|credential| stored.verify(&credential, config.pepper()))
        })
        .await
        .map_err(|e| AuthError::SessionEstablishment(format!("credential task failed: {e}")))?
        .map_err(|e| AuthError::SessionEstablishment(e.to_string()))?;

        if !authenticated {
            return Err(AuthError::SessionEstablishment(
                "derived credential rejected by stored hash".into(),
            ));
        }

        let session = AuthSession::new(account.account_id, self.config.session_ttl_chrono(), now);
        self.repo
            .create_session(&session)
            .await
            .map_err(|e| AuthError::SessionEstablishment(e.to_string()))?;

        Ok(session)
    }

    /// Fire-and-forget; failure is logged only
    fn send_welcome(&self, phone: &Phone) {
        if self.config.testing_mode {
            return;
        }

        let notifier = self.notifier.clone();
        let phone = phone.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_welcome(&phone).await {
                tracing::warn!(phone = %phone.masked(), error = %e, "Welcome message failed");
            }
        });
    }
}
