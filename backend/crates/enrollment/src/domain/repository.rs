//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer (`infra::postgres`, `infra::memory`).

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, DisciplineId, EnrollmentId, SubscriptionId};

use crate::domain::entity::{discipline::Discipline, enrollment::Enrollment, subscription::Subscription};
use crate::domain::value_object::{slug::Slug, subscription_status::SubscriptionStatus};
use crate::error::EnrollmentResult;

/// Discipline catalogue
#[trait_variant::make(DisciplineRepository: Send)]
pub trait LocalDisciplineRepository {
    async fn create_discipline(&self, discipline: &Discipline) -> EnrollmentResult<()>;

    async fn find_discipline_by_id(&self, discipline_id: &DisciplineId) -> EnrollmentResult<Option<Discipline>>;

    async fn find_discipline_by_slug(&self, slug: &Slug) -> EnrollmentResult<Option<Discipline>>;

    /// Oldest first
    async fn list_disciplines(&self) -> EnrollmentResult<Vec<Discipline>>;

    /// Recompute every `subscribers` counter from the live count of active
    /// enrollments. Returns the number of disciplines whose counter changed.
    async fn reconcile_subscribers(&self) -> EnrollmentResult<u64>;
}

/// Outcome of [`EnrollmentRepository::start_enrollment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartEnrollment {
    /// Inserted; `replaced` were stopped in the same unit of work
    Started { replaced: Vec<Enrollment> },
    /// An active enrollment for the target discipline already exists
    AlreadyActive(Enrollment),
    /// The active set no longer matches the expected one. Nothing written.
    Stale { active: Vec<Enrollment> },
}

/// Enrollment store
///
/// Writes for one account are serialized; the counter of each affected
/// discipline is adjusted in the same unit of work and never drops below 0.
#[trait_variant::make(EnrollmentRepository: Send)]
pub trait LocalEnrollmentRepository {
    /// Active enrollments of the account, newest first
    async fn list_active_enrollments(&self, account_id: &AccountId) -> EnrollmentResult<Vec<Enrollment>>;

    /// Stop exactly the enrollments in `expected_active` (sorted ids of the
    /// account's current active set), then insert `enrollment`.
    async fn start_enrollment(
        &self,
        enrollment: &Enrollment,
        expected_active: &[EnrollmentId],
    ) -> EnrollmentResult<StartEnrollment>;

    /// Stop the active enrollment for the pair. `None` when there is none.
    async fn stop_enrollment(
        &self,
        account_id: &AccountId,
        discipline_id: &DisciplineId,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<Option<Enrollment>>;
}

/// Fields written when a checkout completes
#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub account_id: AccountId,
    pub customer_ref: Option<String>,
    pub subscription_ref: String,
    pub status: SubscriptionStatus,
    pub period_end: Option<DateTime<Utc>>,
}

/// Subscription store
#[trait_variant::make(SubscriptionRepository: Send)]
pub trait LocalSubscriptionRepository {
    /// Most recently created record (ties broken by insertion order)
    async fn find_latest_subscription(&self, account_id: &AccountId) -> EnrollmentResult<Option<Subscription>>;

    /// Update the account's latest record, or insert one if it has none
    async fn record_checkout(&self, checkout: &CheckoutRecord, now: DateTime<Utc>) -> EnrollmentResult<Subscription>;

    /// Set status and period end of the record with this processor reference
    async fn update_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64>;

    /// Set status only, keeping the period end
    async fn set_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64>;

    /// Demote access-granting records whose period ended before `now`
    async fn expire_lapsed_subscriptions(&self, now: DateTime<Utc>) -> EnrollmentResult<Vec<SubscriptionId>>;
}

/// Everything the enrollment HTTP surface needs from one store
pub trait EnrollmentStore:
    DisciplineRepository + EnrollmentRepository + SubscriptionRepository + Clone + Send + Sync + 'static
{
}

impl<T> EnrollmentStore for T where
    T: DisciplineRepository
        + EnrollmentRepository
        + SubscriptionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
