//! Subscription Sync Use Case
//!
//! Entry points for the payment collaborator adapter. Each maps one
//! processor event onto a subscription record write; the event wire format
//! stays in the adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::AccountId;

use crate::domain::entity::subscription::Subscription;
use crate::domain::repository::{CheckoutRecord, SubscriptionRepository};
use crate::domain::value_object::subscription_status::SubscriptionStatus;
use crate::error::{EnrollmentError, EnrollmentResult};

pub struct SubscriptionSyncUseCase<R>
where
    R: SubscriptionRepository,
{
    repo: Arc<R>,
}

impl<R> SubscriptionSyncUseCase<R>
where
    R: SubscriptionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Checkout completed: upsert the account's record
    pub async fn record_checkout(
        &self,
        account_id: AccountId,
        customer_ref: Option<&str>,
        subscription_ref: &str,
        status: &str,
        period_end: Option<DateTime<Utc>>,
    ) -> EnrollmentResult<Subscription> {
        let subscription_ref = non_blank(subscription_ref, "subscriptionRef")?;

        let checkout = CheckoutRecord {
            account_id,
            customer_ref: customer_ref.map(str::to_string),
            subscription_ref,
            status: SubscriptionStatus::parse(status),
            period_end,
        };

        let subscription = self.repo.record_checkout(&checkout, Utc::now()).await?;

        tracing::info!(
            account_id = %account_id,
            subscription_id = %subscription.subscription_id,
            status = %subscription.status,
            "Checkout recorded"
        );

        Ok(subscription)
    }

    /// Subscription updated (renewal, plan change)
    pub async fn update_status(
        &self,
        subscription_ref: &str,
        status: &str,
        period_end: Option<DateTime<Utc>>,
    ) -> EnrollmentResult<u64> {
        let subscription_ref = non_blank(subscription_ref, "subscriptionRef")?;
        let status = SubscriptionStatus::parse(status);

        let updated = self
            .repo
            .update_subscription_status(&subscription_ref, status, period_end, Utc::now())
            .await?;

        self.log_write(&subscription_ref, status, updated);
        Ok(updated)
    }

    /// Subscription deleted at the processor
    pub async fn mark_canceled(&self, subscription_ref: &str) -> EnrollmentResult<u64> {
        self.set_status(subscription_ref, SubscriptionStatus::Canceled).await
    }

    /// Invoice payment failed
    pub async fn mark_past_due(&self, subscription_ref: &str) -> EnrollmentResult<u64> {
        self.set_status(subscription_ref, SubscriptionStatus::PastDue).await
    }

    async fn set_status(&self, subscription_ref: &str, status: SubscriptionStatus) -> EnrollmentResult<u64> {
        let subscription_ref = non_blank(subscription_ref, "subscriptionRef")?;

        let updated = self
            .repo
            .set_subscription_status(&subscription_ref, status, Utc::now())
            .await?;

        self.log_write(&subscription_ref, status, updated);
        Ok(updated)
    }

    fn log_write(&self, subscription_ref: &str, status: SubscriptionStatus, updated: u64) {
        if updated == 0 {
            tracing::warn!(subscription_ref = %subscription_ref, status = %status, "No subscription matches reference");
        } else {
            tracing::info!(subscription_ref = %subscription_ref, status = %status, "Subscription status updated");
        }
    }
}

fn non_blank(value: &str, field: &'static str) -> EnrollmentResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EnrollmentError::MissingField(field));
    }
    Ok(value.to_string())
}
