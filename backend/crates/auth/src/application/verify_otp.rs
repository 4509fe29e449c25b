//! Verify OTP Use Case
//!
//! Consume the phone's live challenge, then hand over to the
//! [`IdentityBinder`]. Every verification failure is the same
//! [`AuthError::InvalidCode`], whatever the cause.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::identity_binder::{BindingOutput, IdentityBinder};
use crate::domain::notifier::Notifier;
use crate::domain::repository::{AccountRepository, AuthSessionRepository, OtpChallengeRepository};
use crate::domain::value_object::phone::Phone;
use crate::error::{AuthError, AuthResult};

pub struct VerifyOtpInput<'a> {
    pub phone: Option<&'a str>,
    pub code: Option<&'a str>,
}

pub struct VerifyOtpUseCase<R, N>
where
    R: OtpChallengeRepository + AccountRepository + AuthSessionRepository,
    N: Notifier + Send + Sync + 'static,
{
    repo: Arc<R>,
    binder: IdentityBinder<R, N>,
    config: Arc<AuthConfig>,
}

impl<R, N> VerifyOtpUseCase<R, N>
where
    R: OtpChallengeRepository + AccountRepository + AuthSessionRepository,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            binder: IdentityBinder::new(repo.clone(), notifier, config.clone()),
            repo,
            config,
        }
    }

    pub async fn execute(&self, input: VerifyOtpInput<'_>) -> AuthResult<BindingOutput> {
        let raw_phone = non_blank(input.phone);
        let code = non_blank(input.code);

        let (Some(raw_phone), Some(code)) = (raw_phone, code) else {
            return Err(AuthError::MissingField(if raw_phone.is_none() { "phone" } else { "otp" }));
        };

        let phone = Phone::parse(raw_phone, &self.config.default_country_code)
            .map_err(|_| AuthError::InvalidPhone)?;

        if !self.repo.verify(&phone, code, Utc::now()).await? {
            return Err(AuthError::InvalidCode);
        }

        tracing::info!(phone = %phone.masked(), "OTP verified");

        self.binder.login_or_register(&phone).await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
