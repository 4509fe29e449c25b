//! PostgreSQL Repository Implementations
//!
//! Enrollment writes take a transaction-scoped advisory lock keyed by the
//! account, so the active-set check and the insert cannot interleave with
//! another join or stop for the same account. The partial unique index
//! `enrollments(account_id) WHERE stopped_at IS NULL` backs the invariant;
//! a violation is reported as `Stale` and the caller re-plans.

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{AccountId, DisciplineId, EnrollmentId, SubscriptionId};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::{discipline::Discipline, enrollment::Enrollment, subscription::Subscription};
use crate::domain::repository::{
    CheckoutRecord, DisciplineRepository, EnrollmentRepository, StartEnrollment,
    SubscriptionRepository,
};
use crate::domain::services::enrollment_ids;
use crate::domain::value_object::{slug::Slug, subscription_status::SubscriptionStatus};
use crate::error::EnrollmentResult;

/// Advisory lock namespaces (second argument of `hashtextextended`)
const ENROLLMENT_LOCK_SEED: i64 = 1;
const SUBSCRIPTION_LOCK_SEED: i64 = 2;

/// PostgreSQL-backed enrollment repository
#[derive(Clone)]
pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_account(
        tx: &mut Transaction<'_, Postgres>,
        account_id: &AccountId,
        seed: i64,
    ) -> EnrollmentResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, $2))")
            .bind(account_id.to_string())
            .bind(seed)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn active_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        account_id: &AccountId,
    ) -> EnrollmentResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT
                enrollment_id,
                account_id,
                discipline_id,
                started_at,
                stopped_at
            FROM enrollments
            WHERE account_id = $1 AND stopped_at IS NULL
            ORDER BY started_at DESC, seq DESC
            FOR UPDATE
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(EnrollmentRow::into_enrollment).collect())
    }

    async fn decrement_subscribers(
        tx: &mut Transaction<'_, Postgres>,
        discipline_id: &DisciplineId,
    ) -> EnrollmentResult<()> {
        sqlx::query(
            "UPDATE disciplines SET subscribers = GREATEST(subscribers - 1, 0) WHERE discipline_id = $1",
        )
        .bind(discipline_id.as_uuid())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Discipline Repository Implementation
// ============================================================================

impl DisciplineRepository for PgEnrollmentRepository {
    async fn create_discipline(&self, discipline: &Discipline) -> EnrollmentResult<()> {
        sqlx::query(
            r#"
            INSERT INTO disciplines (
                discipline_id,
                slug,
                title,
                short_desc,
                long_desc,
                length_days,
                subscribers,
                tag,
                img_url,
                metadata,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(discipline.discipline_id.as_uuid())
        .bind(discipline.slug.as_str())
        .bind(&discipline.title)
        .bind(&discipline.short_desc)
        .bind(&discipline.long_desc)
        .bind(discipline.length_days)
        .bind(discipline.subscribers.max(0))
        .bind(&discipline.tag)
        .bind(&discipline.img_url)
        .bind(&discipline.metadata)
        .bind(discipline.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_discipline_by_id(&self, discipline_id: &DisciplineId) -> EnrollmentResult<Option<Discipline>> {
        let row = sqlx::query_as::<_, DisciplineRow>(
            r#"
            SELECT
                discipline_id,
                slug,
                title,
                short_desc,
                long_desc,
                length_days,
                subscribers,
                tag,
                img_url,
                metadata,
                created_at
            FROM disciplines
            WHERE discipline_id = $1
            "#,
        )
        .bind(discipline_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DisciplineRow::into_discipline))
    }

    async fn find_discipline_by_slug(&self, slug: &Slug) -> EnrollmentResult<Option<Discipline>> {
        let row = sqlx::query_as::<_, DisciplineRow>(
            r#"
            SELECT
                discipline_id,
                slug,
                title,
                short_desc,
                long_desc,
                length_days,
                subscribers,
                tag,
                img_url,
                metadata,
                created_at
            FROM disciplines
            WHERE slug = $1
            "#,
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DisciplineRow::into_discipline))
    }

    async fn list_disciplines(&self) -> EnrollmentResult<Vec<Discipline>> {
        let rows = sqlx::query_as::<_, DisciplineRow>(
            r#"
            SELECT
                discipline_id,
                slug,
                title,
                short_desc,
                long_desc,
                length_days,
                subscribers,
                tag,
                img_url,
                metadata,
                created_at
            FROM disciplines
            ORDER BY created_at ASC, slug ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DisciplineRow::into_discipline).collect())
    }

    async fn reconcile_subscribers(&self) -> EnrollmentResult<u64> {
        let changed = sqlx::query(
            r#"
            UPDATE disciplines d
            SET subscribers = live.active
            FROM (
                SELECT d2.discipline_id, COUNT(e.enrollment_id) AS active
                FROM disciplines d2
                LEFT JOIN enrollments e
                    ON e.discipline_id = d2.discipline_id AND e.stopped_at IS NULL
                GROUP BY d2.discipline_id
            ) live
            WHERE d.discipline_id = live.discipline_id
              AND d.subscribers <> live.active
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(changed)
    }
}

// ============================================================================
// Enrollment Repository Implementation
// ============================================================================

impl EnrollmentRepository for PgEnrollmentRepository {
    async fn list_active_enrollments(&self, account_id: &AccountId) -> EnrollmentResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT
                enrollment_id,
                account_id,
                discipline_id,
                started_at,
                stopped_at
            FROM enrollments
            WHERE account_id = $1 AND stopped_at IS NULL
            ORDER BY started_at DESC, seq DESC
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EnrollmentRow::into_enrollment).collect())
    }

    async fn start_enrollment(
        &self,
        enrollment: &Enrollment,
        expected_active: &[EnrollmentId],
    ) -> EnrollmentResult<StartEnrollment> {
        let mut tx = self.pool.begin().await?;
        Self::lock_account(&mut tx, &enrollment.account_id, ENROLLMENT_LOCK_SEED).await?;

        let active = Self::active_in_tx(&mut tx, &enrollment.account_id).await?;

        if let Some(existing) = active
            .iter()
            .find(|e| e.discipline_id == enrollment.discipline_id)
        {
            let existing = existing.clone();
            tx.commit().await?;
            return Ok(StartEnrollment::AlreadyActive(existing));
        }

        if enrollment_ids(&active) != expected_active {
            tx.commit().await?;
            return Ok(StartEnrollment::Stale { active });
        }

        let now = enrollment.started_at;
        let mut replaced = Vec::with_capacity(active.len());
        for mut record in active {
            sqlx::query("UPDATE enrollments SET stopped_at = $2 WHERE enrollment_id = $1")
                .bind(record.enrollment_id.as_uuid())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            Self::decrement_subscribers(&mut tx, &record.discipline_id).await?;
            record.stop(now);
            replaced.push(record);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO enrollments (
                enrollment_id,
                account_id,
                discipline_id,
                started_at,
                stopped_at
            ) VALUES ($1, $2, $3, $4, NULL)
            "#,
        )
        .bind(enrollment.enrollment_id.as_uuid())
        .bind(enrollment.account_id.as_uuid())
        .bind(enrollment.discipline_id.as_uuid())
        .bind(enrollment.started_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                // Dropping the transaction rolls back the stops above.
                tracing::debug!(account_id = %enrollment.account_id, "Active enrollment index conflict");
                return Ok(StartEnrollment::Stale { active: Vec::new() });
            }
            Err(e) => return Err(e.into()),
        }

        sqlx::query("UPDATE disciplines SET subscribers = subscribers + 1 WHERE discipline_id = $1")
            .bind(enrollment.discipline_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(StartEnrollment::Started { replaced })
    }

    async fn stop_enrollment(
        &self,
        account_id: &AccountId,
        discipline_id: &DisciplineId,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<Option<Enrollment>> {
        let mut tx = self.pool.begin().await?;
        Self::lock_account(&mut tx, account_id, ENROLLMENT_LOCK_SEED).await?;

        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            UPDATE enrollments
            SET stopped_at = $3
            WHERE account_id = $1 AND discipline_id = $2 AND stopped_at IS NULL
            RETURNING
                enrollment_id,
                account_id,
                discipline_id,
                started_at,
                stopped_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(discipline_id.as_uuid())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(stopped) = row.map(EnrollmentRow::into_enrollment) else {
            tx.commit().await?;
            return Ok(None);
        };

        Self::decrement_subscribers(&mut tx, discipline_id).await?;
        tx.commit().await?;

        Ok(Some(stopped))
    }
}

// ============================================================================
// Subscription Repository Implementation
// ============================================================================

impl SubscriptionRepository for PgEnrollmentRepository {
    async fn find_latest_subscription(&self, account_id: &AccountId) -> EnrollmentResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT
                subscription_id,
                account_id,
                customer_ref,
                subscription_ref,
                status,
                period_end,
                created_at,
                updated_at
            FROM subscriptions
            WHERE account_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SubscriptionRow::into_subscription))
    }

    async fn record_checkout(&self, checkout: &CheckoutRecord, now: DateTime<Utc>) -> EnrollmentResult<Subscription> {
        let mut tx = self.pool.begin().await?;
        Self::lock_account(&mut tx, &checkout.account_id, SUBSCRIPTION_LOCK_SEED).await?;

        let updated = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions SET
                customer_ref = $2,
                subscription_ref = $3,
                status = $4,
                period_end = $5,
                updated_at = $6
            WHERE subscription_id = (
                SELECT subscription_id FROM subscriptions
                WHERE account_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT 1
            )
            RETURNING
                subscription_id,
                account_id,
                customer_ref,
                subscription_ref,
                status,
                period_end,
                created_at,
                updated_at
            "#,
        )
        .bind(checkout.account_id.as_uuid())
        .bind(&checkout.customer_ref)
        .bind(&checkout.subscription_ref)
        .bind(checkout.status.as_str())
        .bind(checkout.period_end)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let subscription = match updated {
            Some(row) => row.into_subscription(),
            None => {
                let mut sub =
                    Subscription::new(checkout.account_id, checkout.status, checkout.period_end, now);
                sub.customer_ref = checkout.customer_ref.clone();
                sub.subscription_ref = Some(checkout.subscription_ref.clone());

                sqlx::query(
                    r#"
                    INSERT INTO subscriptions (
                        subscription_id,
                        account_id,
                        customer_ref,
                        subscription_ref,
                        status,
                        period_end,
                        created_at,
                        updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(sub.subscription_id.as_uuid())
                .bind(sub.account_id.as_uuid())
                .bind(&sub.customer_ref)
                .bind(&sub.subscription_ref)
                .bind(sub.status.as_str())
                .bind(sub.period_end)
                .bind(sub.created_at)
                .bind(sub.updated_at)
                .execute(&mut *tx)
                .await?;

                sub
            }
        };

        tx.commit().await?;
        Ok(subscription)
    }

    async fn update_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64> {
        let updated = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                period_end = $3,
                updated_at = $4
            WHERE subscription_ref = $1
            "#,
        )
        .bind(subscription_ref)
        .bind(status.as_str())
        .bind(period_end)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated)
    }

    async fn set_subscription_status(
        &self,
        subscription_ref: &str,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> EnrollmentResult<u64> {
        let updated = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE subscription_ref = $1",
        )
        .bind(subscription_ref)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated)
    }

    async fn expire_lapsed_subscriptions(&self, now: DateTime<Utc>) -> EnrollmentResult<Vec<SubscriptionId>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE subscriptions SET
                status = 'canceled',
                updated_at = $1
            WHERE status IN ('active', 'trialing', 'past_due')
              AND period_end IS NOT NULL
              AND period_end < $1
            RETURNING subscription_id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids
            .into_iter()
            .map(|(id,)| SubscriptionId::from_uuid(id))
            .collect())
    }
}

// ============================================================================
// Internal row types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct DisciplineRow {
    discipline_id: Uuid,
    slug: String,
    title: Option<String>,
    short_desc: Option<String>,
    long_desc: Option<String>,
    length_days: Option<i32>,
    subscribers: i64,
    tag: Option<String>,
    img_url: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl DisciplineRow {
    fn into_discipline(self) -> Discipline {
        Discipline {
            discipline_id: DisciplineId::from_uuid(self.discipline_id),
            slug: Slug::from_db(self.slug),
            title: self.title,
            short_desc: self.short_desc,
            long_desc: self.long_desc,
            length_days: self.length_days,
            subscribers: self.subscribers.max(0),
            tag: self.tag,
            img_url: self.img_url,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    enrollment_id: Uuid,
    account_id: Uuid,
    discipline_id: Uuid,
    started_at: DateTime<Utc>,
    stopped_at: Option<DateTime<Utc>>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> Enrollment {
        Enrollment {
            enrollment_id: EnrollmentId::from_uuid(self.enrollment_id),
            account_id: AccountId::from_uuid(self.account_id),
            discipline_id: DisciplineId::from_uuid(self.discipline_id),
            started_at: self.started_at,
            stopped_at: self.stopped_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    subscription_id: Uuid,
    account_id: Uuid,
    customer_ref: Option<String>,
    subscription_ref: Option<String>,
    status: String,
    period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> Subscription {
        Subscription {
            subscription_id: SubscriptionId::from_uuid(self.subscription_id),
            account_id: AccountId::from_uuid(self.account_id),
            customer_ref: self.customer_ref,
            subscription_ref: self.subscription_ref,
            status: SubscriptionStatus::parse(&self.status),
            period_end: self.period_end,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
