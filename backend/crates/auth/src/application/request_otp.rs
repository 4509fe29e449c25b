//! Request OTP Use Case
//!
//! Normalize and validate the phone, apply the per-phone rate limit,
//! persist a fresh challenge (superseding older ones), then deliver it.
//!
//! Delivery is decoupled from persistence: a notifier failure never undoes
//! the stored challenge and never fails the request. It is reported as
//! [`Delivery::Failed`]; the code is disclosed only when
//! `disclose_on_delivery_failure` is set.

use std::sync::Arc;

use chrono::Utc;
use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::domain::entity::otp_challenge::OtpChallenge;
use crate::domain::notifier::Notifier;
use crate::domain::repository::OtpChallengeRepository;
use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};
use crate::error::{AuthError, AuthResult};

/// How the code reached (or did not reach) the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Test mode: delivery skipped on purpose
    Skipped,
    /// Notifier failed; the code is disclosed only if configured
    Failed,
}

pub struct RequestOtpOutput {
    pub phone: Phone,
    pub delivery: Delivery,
    /// Present only in test mode or after a delivery failure with fallback
    pub debug_otp: Option<String>,
}

impl RequestOtpOutput {
    pub fn message(&self) -> &'static str {
        match self.delivery {
            Delivery::Sent => "Verification code sent",
            Delivery::Skipped => "Verification code generated (test mode)",
            Delivery::Failed => "Verification code generated (delivery unavailable)",
        }
    }
}

/// Request OTP use case
pub struct RequestOtpUseCase<R, N>
where
    R: OtpChallengeRepository + RateLimitStore,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<R, N> RequestOtpUseCase<R, N>
where
    R: OtpChallengeRepository + RateLimitStore,
    N: Notifier,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, raw_phone: Option<&str>) -> AuthResult<RequestOtpOutput> {
        let raw_phone = raw_phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingField("phone"))?;

        let phone = Phone::parse(raw_phone, &self.config.default_country_code)
            .map_err(|_| AuthError::InvalidPhone)?;

        let now = Utc::now();

        let limit = self
            .repo
            .check_and_increment(
                &format!("otp:{}", phone.as_str()),
                &self.config.otp_rate_limit,
                now.timestamp_millis(),
            )
            .await
            .map_err(|e| AuthError::Internal(format!("Rate limit store failed: {e}")))?;

        if !limit.allowed {
            tracing::warn!(phone = %phone.masked(), reset_at_ms = limit.reset_at_ms, "OTP rate limit hit");
            return Err(AuthError::RateLimited);
        }

        let code = OtpCode::generate();
        let challenge =
            OtpChallenge::issue(phone.clone(), code.clone(), now, self.config.otp_ttl_chrono());

        self.repo.issue(&challenge).await?;

        tracing::info!(
            phone = %phone.masked(),
            challenge_id = %challenge.challenge_id,
            "OTP challenge issued"
        );

        if self.config.testing_mode {
            tracing::debug!(phone = %phone.masked(), code = %code.as_str(), "Test mode: OTP not sent");
            return Ok(RequestOtpOutput {
                phone,
                delivery: Delivery::Skipped,
                debug_otp: Some(code.as_str().to_string()),
            });
        }

        match self.notifier.send_code(&phone, &code).await {
            Ok(()) => Ok(RequestOtpOutput {
                phone,
                delivery: Delivery::Sent,
                debug_otp: None,
            }),
            Err(e) => {
                let debug_otp = if self.config.disclose_on_delivery_failure {
                    tracing::warn!(
                        phone = %phone.masked(),
                        error = %e,
                        "OTP delivery failed, disclosing code in response"
                    );
                    tracing::debug!(phone = %phone.masked(), code = %code.as_str(), "Disclosed OTP");
                    Some(code.as_str().to_string())
                } else {
                    tracing::warn!(phone = %phone.masked(), error = %e, "OTP delivery failed");
                    None
                };
                Ok(RequestOtpOutput {
                    phone,
                    delivery: Delivery::Failed,
                    debug_otp,
                })
            }
        }
    }
}
