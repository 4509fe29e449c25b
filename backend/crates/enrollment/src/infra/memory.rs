//! In-Memory Repository
//!
//! One async mutex over all tables; holding the lock is the transaction.
//! Used by tests and local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, DisciplineId, EnrollmentId, SubscriptionId};
use tokio::sync::Mutex;

use crate::domain::entity::{discipline::Discipline, enrollment::Enrollment, subscription::Subscription};
use crate::domain::repository::{
    CheckoutRecord, DisciplineRepository, EnrollmentRepository, StartEnrollment,
    SubscriptionRepository,
};
use crate::domain::services::enrollment_ids;
use crate::domain::value_object::{slug::Slug, subscription_status::SubscriptionStatus};
use crate::error::EnrollmentResult;

#[derive(Default)]
struct State {
    disciplines: HashMap<DisciplineId, Discipline>,
    /// Insertion order doubles as the `seq` tie-break
    enrollments: Vec<Enrollment>,
    subscriptions: Vec<Subscription>,
}

impl State {
    fn active_for(&self, account_id: &AccountId) -> Vec<Enrollment> {
        let mut active: Vec<(usize, Enrollment)> = self
            .enrollments
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.account_id == account_id && e.is_active())
            .map(|(seq, e)| (seq, e.clone()))
            .collect();
        active.sort_by(|(sa, a), (sb, b)| b.started_at.cmp(&a.started_at).then(sb.cmp(sa)));
        active.into_iter().map(|(_, e)| e).collect()
    }

    fn adjust_subscribers(&mut self, discipline_id: &DisciplineId, delta: i64) {
        if let Some(d) = self.disciplines.get_mut(discipline_id) {
            d.subscribers = (d.subscribers + delta).max(0);
        }
    }

    fn latest_subscription_index(&self, account_id: &AccountId) -> Option<usize> {
        self.subscriptions
            .iter()
            .enumerate()
            .filter(|(_, s)| &s.account_id == account_id)
            .max_by_key(|(seq, s)| (s.created_at, *seq))
            .map(|(seq, _)| seq)
    }

    fn update_by_ref(&mut self, subscription_ref: &str, mut apply: impl FnMut(&mut Subscription)) -> u64 {
        let mut updated = 0;
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.subscription_ref.as_deref() == Some(subscription_ref))
        {
            apply(sub);
            updated += 1;
        }
        updated
    }
}

#[derive(Clone, Default)]
pub struct MemoryEnrollmentRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is (seeding and tests)
    pub async fn insert_subscription(&self, subscription: Subscription) {
        self.state.lock().await.subscriptions.push(subscription);
    }

    pub async fn subscribers_of(&self, discipline_id: &DisciplineId) -> Option<i64> {
        let state = self.state.lock().await;
        state.disciplines.get(discipline_id).map(|d| d.subscribers)
    }

    /// Overwrite a counter, simulating drift
    pub async fn set_subscribers(&self, discipline_id: &DisciplineId, subscribers: i64) {
        let mut state = self.state.lock().await;
        if let Some(d) = state.disciplines.get_mut(discipline_id) {
            d.subscribers = subscribers;
        }
    }

    /// Full history of an account, oldest first
    pub async fn enrollments_of(&self, account_id: &AccountId) -> Vec<Enrollment> {
        let state = self.state.lock().await;
        state
            .enrollments
            .iter()
            .filter(|e| &e.account_id == account_id)
            .cloned()
            .collect()
    }
}

impl DisciplineRepository for MemoryEnrollmentRepository {
    async fn create_discipline(&self, discipline: &Discipline) -> EnrollmentResult<()> {
        let mut state = self.state.lock().await;
        state
            .disciplines
            .insert(discipline.discipline_id, discipline.clone());
        Ok(())
    }

    async fn find_discipline_by_id(&self, discipline_id: &DisciplineId) -> EnrollmentResult<Option<Discipline>> {
        Ok(self.state.lock().await.disciplines.get(discipline_id).cloned())
    }

    async fn find_discipline_by_slug(&self, slug: &Slug) -> EnrollmentResult<Option<Discipline>> {
        let state = self.state.lock().await;
        Ok(state.disciplines.values().find(|d| &d.slug == slug).cloned())
    }

    async fn list_disciplines(&self) -> EnrollmentResult<Vec<Discipline>> {
        let state = self.state.lock().await;
        let mut disciplines: Vec<Discipline> = state.disciplines.values().cloned().collect();
        disciplines.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.slug.as_str().cmp(b.slug.as_str()))
        });
        Ok(disciplines)
    }

    async fn reconcile_subscribers(&self) -> EnrollmentResult<u64> {
        let mut state = self.state.lock().await;

        let mut live: HashMap<DisciplineId, i64> = HashMap::new();
        for e in state.enrollments.iter().filter(|e| e.is_active()) {
            *live.entry(e.discipline_id).or_default() += 1;
        }

        let mut changed = 0;
        for (id, discipline) in state.disciplines.iter_mut() {
            let count = live.get(id).copied().unwrap_or(0);
            if discipline.subscribers != count {
                discipline.subscribers = count;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

impl EnrollmentRepository for MemoryEnrollmentRepository {
    async fn list_active_enrollments(&self, account_id: &AccountId) -> EnrollmentResult<Vec<Enrollment>> {
        Ok(self.state.lock().await.active_for(account_id))
    }

    async fn start_enrollment(
        &self,
        enrollment: &Enrollment,
        expected_active: &[EnrollmentId],
    ) -> EnrollmentResult<StartEnrollment> {
        let mut state = self.state.lock().await;
        let active = state.active_for(&enrollment.account_id);

        if let Some(existing) = active
            .iter()
            .find(|e| e.discipline_id == enrollment.discipline_id)
        {
            return Ok(StartEnrollment::AlreadyActive(existing.clone()));
        }

        if enrollment_ids(&active) != expected_active {
            return Ok(StartEnrollment::Stale { active });
        }

        let now = enrollment.started_at;
        let mut replaced = Vec::with_capacity(active.len());
        for record in state
            .enrollments
            .iter_mut()
            .filter(|e| expected_active.contains(&e.enrollment_id))
        {
            record.stop(now);
            replaced.push(record.clone());
        }
        for stopped in &replaced {
            state.adjust_subscribers(&stopped.discipline_id, -1);
        }

        state.enrollments.push(enrollment.clone());
        state.adjust_subscribers(&enrollment.discipline_id, 1);

        Ok(StartEnrollment::Started { replaced })
    }

    async fn stop_enrollment(
        &self,
        account_id: &AccountId,
        discipline_id: &DisciplineId,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<Option<Enrollment>> {
        let mut state = self.state.lock().await;

        let Some(record) = state.enrollments.iter_mut().find(|e| {
            &e.account_id == account_id && &e.discipline_id == discipline_id && e.is_active()
        }) else {
            return Ok(None);
        };

        record.stop(now);
        let stopped = record.clone();
        state.adjust_subscribers(discipline_id, -1);

        Ok(Some(stopped))
    }
}

impl SubscriptionRepository for MemoryEnrollmentRepository {
    async fn find_latest_subscription(&self, account_id: &AccountId) -> EnrollmentResult<Option<Subscription>> {
        let state = self.state.lock().await;
        Ok(state
            .latest_subscription_index(account_id)
            .map(|i| state.subscriptions[i].clone()))
    }

    async fn record_checkout(&self, checkout: &CheckoutRecord, now: DateTime<Utc>) -> EnrollmentResult<Subscription> {
        let mut state = self.state.lock().await;

        if let Some(i) = state.latest_subscription_index(&checkout.account_id) {
            let sub = &mut state.subscriptions[i];
            sub.customer_ref = checkout.customer_ref.clone();
            sub.subscription_ref = Some(checkout.subscription_ref.clone());
            sub.status = checkout.status;
            sub.period_end = checkout.period_end;
            sub.updated_at = now;
            return Ok(sub.clone());
        }

        let mut sub = Subscription::new(checkout.account_id, checkout.status, checkout.period_end, now);
        sub.customer_ref = checkout.customer_ref.clone();
        sub.subscription_ref = Some(checkout.subscription_ref.clone());
        state.subscriptions.push(sub.clone());
        Ok(sub)
    }

    async fn update_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64> {
        let mut state = self.state.lock().await;
        Ok(state.update_by_ref(subscription_ref, |sub| {
            sub.status = status;
            sub.period_end = period_end;
            sub.updated_at = now;
        }))
    }

    async fn set_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64> {
        let mut state = self.state.lock().await;
        Ok(state.update_by_ref(subscription_ref, |sub| {
            sub.status = status;
            sub.updated_at = now;
        }))
    }

    async fn expire_lapsed_subscriptions(&self, now: DateTime<Utc>) -> EnrollmentResult<Vec<SubscriptionId>> {
        let mut state = self.state.lock().await;
        let mut ids = Vec::new();
        for sub in state.subscriptions.iter_mut().filter(|s| s.is_lapsed_at(now)) {
            sub.status = SubscriptionStatus::Canceled;
            sub.updated_at = now;
            ids.push(sub.subscription_id);
        }
        Ok(ids)
    }
}
