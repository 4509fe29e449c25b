//! Enrollment Housekeeping
//!
//! Periodic convergence: expire lapsed subscriptions, then recompute the
//! subscriber counters from live enrollment counts.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::EnrollmentConfig;
use crate::application::expire_subscriptions::ExpireSubscriptionsUseCase;
use crate::domain::repository::{DisciplineRepository, SubscriptionRepository};
use crate::error::EnrollmentResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentHousekeepingReport {
    pub subscriptions_expired: usize,
    pub counters_reconciled: u64,
}

pub struct EnrollmentHousekeepingUseCase<R>
where
    R: DisciplineRepository + SubscriptionRepository,
{
    repo: Arc<R>,
    config: Arc<EnrollmentConfig>,
}

impl<R> EnrollmentHousekeepingUseCase<R>
where
    R: DisciplineRepository + SubscriptionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> EnrollmentResult<EnrollmentHousekeepingReport> {
        let expired = ExpireSubscriptionsUseCase::new(self.repo.clone(), self.config.clone())
            .execute(now)
            .await?;

        let counters_reconciled = self.repo.reconcile_subscribers().await?;
        if counters_reconciled > 0 {
            tracing::info!(disciplines = counters_reconciled, "Subscriber counters reconciled");
        }

        Ok(EnrollmentHousekeepingReport {
            subscriptions_expired: expired.updated(),
            counters_reconciled,
        })
    }

    pub async fn execute_now(&self) -> EnrollmentResult<EnrollmentHousekeepingReport> {
        self.execute(Utc::now()).await
    }
}
