//! Auth Housekeeping
//!
//! Advisory cleanup run by the binary on startup and on an interval.
//! Safe to run concurrently with live traffic.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::repository::{AuthSessionRepository, OtpChallengeRepository};
use crate::error::AuthResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthHousekeepingReport {
    pub otp_challenges_deleted: u64,
    pub sessions_deleted: u64,
}

pub struct AuthHousekeepingUseCase<R>
where
    R: OtpChallengeRepository + AuthSessionRepository,
{
    repo: Arc<R>,
}

impl<R> AuthHousekeepingUseCase<R>
where
    R: OtpChallengeRepository + AuthSessionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> AuthResult<AuthHousekeepingReport> {
        let report = AuthHousekeepingReport {
            otp_challenges_deleted: self.repo.sweep_expired(now).await?,
            sessions_deleted: self.repo.cleanup_expired_sessions(now).await?,
        };

        tracing::info!(
            otp_challenges_deleted = report.otp_challenges_deleted,
            sessions_deleted = report.sessions_deleted,
            "Auth housekeeping completed"
        );

        Ok(report)
    }
}
