//! Check Access Use Case

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::access_gate::{self, AccessDecision};
use crate::domain::repository::SubscriptionRepository;
use crate::error::EnrollmentResult;

pub struct CheckAccessUseCase<R>
where
    R: SubscriptionRepository,
{
    repo: Arc<R>,
}

impl<R> CheckAccessUseCase<R>
where
    R: SubscriptionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, account_id: AccountId) -> EnrollmentResult<AccessDecision> {
        let subscription = self.repo.find_latest_subscription(&account_id).await?;
        Ok(access_gate::evaluate(subscription.as_ref()))
    }
}
