//! Check Session Use Case
//!
//! Verifies and retrieves session information.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::AccountId;

use crate::application::config::AuthConfig;
use crate::application::session_token::parse_session_token;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthSessionRepository;
use crate::error::{AuthError, AuthResult};

/// Session info output
pub struct SessionInfoOutput {
    pub account_id: AccountId,
    pub expires_at_ms: i64,
}

/// Check session use case
pub struct CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Send + Sync + 'static,
{
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Check if session is valid and return session info
    pub async fn execute(&self, session_token: &str) -> AuthResult<SessionInfoOutput> {
        let session = self.get_session(session_token).await?;

        Ok(SessionInfoOutput {
            account_id: session.account_id,
            expires_at_ms: session.expires_at_ms,
        })
    }

    /// Get session and update last activity
    pub async fn get_session(&self, session_token: &str) -> AuthResult<AuthSession> {
        let session_id = parse_session_token(&self.config.session_secret, session_token)?;

        let mut session = self
            .session_repo
            .find_session(session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let now = Utc::now();
        if session.is_expired_at(now) {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        session.touch(now);
        session.extend_if_needed(self.config.session_ttl_chrono(), now);

        // Update in background
        let session_clone = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update_session(&session_clone).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
