//! Expire Subscriptions Use Case
//!
//! Demotes access-granting records whose period has ended to `canceled`.
//! Covers missed cancellation webhooks. Runs from the cron endpoint and the
//! housekeeping task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::SubscriptionId;
use platform::crypto::constant_time_eq;

use crate::application::config::EnrollmentConfig;
use crate::domain::repository::SubscriptionRepository;
use crate::error::{EnrollmentError, EnrollmentResult};

#[derive(Debug, Clone, Default)]
pub struct ExpiryReport {
    pub ids: Vec<SubscriptionId>,
}

impl ExpiryReport {
    pub fn updated(&self) -> usize {
        self.ids.len()
    }

    pub fn message(&self) -> String {
        if self.ids.is_empty() {
            "No expired subscriptions".to_string()
        } else {
            format!("Expired {} subscription(s)", self.ids.len())
        }
    }
}

pub struct ExpireSubscriptionsUseCase<R>
where
    R: SubscriptionRepository,
{
    repo: Arc<R>,
    config: Arc<EnrollmentConfig>,
}

impl<R> ExpireSubscriptionsUseCase<R>
where
    R: SubscriptionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Self {
        Self { repo, config }
    }

    /// Check `Authorization: Bearer <cron secret>`. Always fails when no
    /// secret is configured.
    pub fn authorize(&self, authorization: Option<&str>) -> EnrollmentResult<()> {
        let Some(secret) = self.config.cron_secret.as_deref().filter(|s| !s.is_empty()) else {
            return Err(EnrollmentError::CronUnauthorized);
        };
        let presented = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(EnrollmentError::CronUnauthorized)?;

        if constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
            Ok(())
        } else {
            Err(EnrollmentError::CronUnauthorized)
        }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> EnrollmentResult<ExpiryReport> {
        let ids = self.repo.expire_lapsed_subscriptions(now).await?;

        if !ids.is_empty() {
            tracing::info!(updated = ids.len(), "Lapsed subscriptions demoted to canceled");
        }

        Ok(ExpiryReport { ids })
    }

    pub async fn execute_now(&self) -> EnrollmentResult<ExpiryReport> {
        self.execute(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryEnrollmentRepository;

    fn use_case(secret: Option<&str>) -> ExpireSubscriptionsUseCase<MemoryEnrollmentRepository> {
        let config = EnrollmentConfig {
            cron_secret: secret.map(str::to_string),
            ..EnrollmentConfig::default()
        };
        ExpireSubscriptionsUseCase::new(Arc::new(MemoryEnrollmentRepository::new()), Arc::new(config))
    }

    #[test]
    fn test_authorize_requires_configured_secret() {
        let uc = use_case(None);
        assert!(uc.authorize(Some("Bearer ")).is_err());
        assert!(uc.authorize(None).is_err());

        let uc = use_case(Some(""));
        assert!(uc.authorize(Some("Bearer ")).is_err());
    }

    #[test]
    fn test_authorize_bearer() {
        let uc = use_case(Some("cron-s3cret"));
        assert!(uc.authorize(Some("Bearer cron-s3cret")).is_ok());
        assert!(uc.authorize(Some("Bearer wrong")).is_err());
        assert!(uc.authorize(Some("cron-s3cret")).is_err());
        assert!(uc.authorize(None).is_err());
    }

    #[test]
    fn test_report_message() {
        assert_eq!(ExpiryReport::default().message(), "No expired subscriptions");
        let report = ExpiryReport {
            ids: vec![SubscriptionId::new(), SubscriptionId::new()],
        };
        assert_eq!(report.updated(), 2);
        assert_eq!(report.message(), "Expired 2 subscription(s)");
    }
}
