//! PostgreSQL Repository Implementations
//!
//! Per-phone OTP operations take a transaction-scoped advisory lock keyed
//! by the phone, so `issue` and `verify` for the same phone serialize while
//! different phones proceed in parallel. The partial unique index
//! `otp_challenges(phone) WHERE verified = false` backs the invariant.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, ChallengeId};
use platform::credential::CredentialHash;
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::{account::Account, auth_session::AuthSession, otp_challenge::OtpChallenge};
use crate::domain::repository::{
    AccountRepository, AuthSessionRepository, CreateAccount, OtpChallengeRepository,
};
use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop rate-limit windows that ended before `before_ms`
    pub async fn purge_rate_limits(&self, before_ms: i64) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM otp_rate_limits WHERE window_start_ms < $1")
            .bind(before_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn lock_phone(tx: &mut Transaction<'_, Postgres>, phone: &Phone) -> AuthResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(phone.as_str())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

// ============================================================================
// OTP Challenge Repository Implementation
// ============================================================================

impl OtpChallengeRepository for PgAuthRepository {
    async fn issue(&self, challenge: &OtpChallenge) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_phone(&mut tx, &challenge.phone).await?;

        let superseded = sqlx::query(
            "UPDATE otp_challenges SET verified = true WHERE phone = $1 AND verified = false",
        )
        .bind(challenge.phone.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO otp_challenges (
                challenge_id,
                phone,
                code,
                expires_at,
                verified,
                attempts,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(challenge.challenge_id.as_uuid())
        .bind(challenge.phone.as_str())
        .bind(challenge.code.as_str())
        .bind(challenge.expires_at)
        .bind(challenge.verified)
        .bind(challenge.attempts as i32)
        .bind(challenge.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if superseded > 0 {
            tracing::debug!(superseded = superseded, "Superseded previous OTP challenges");
        }

        Ok(())
    }

    async fn verify(&self, phone: &Phone, code: &str, now: DateTime<Utc>) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_phone(&mut tx, phone).await?;

        let row = sqlx::query_as::<_, OtpChallengeRow>(
            r#"
            SELECT
                challenge_id,
                phone,
                code,
                expires_at,
                verified,
                attempts,
                created_at
            FROM otp_challenges
            WHERE phone = $1 AND verified = false
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(challenge) = row.map(OtpChallengeRow::into_challenge) else {
            tx.commit().await?;
            return Ok(false);
        };

        let accepted = challenge.accepts(code, now);

        if accepted {
            sqlx::query("UPDATE otp_challenges SET verified = true WHERE challenge_id = $1")
                .bind(challenge.challenge_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("UPDATE otp_challenges SET attempts = attempts + 1 WHERE challenge_id = $1")
                .bind(challenge.challenge_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(accepted)
    }

    async fn find_latest_unverified(&self, phone: &Phone) -> AuthResult<Option<OtpChallenge>> {
        let row = sqlx::query_as::<_, OtpChallengeRow>(
            r#"
            SELECT
                challenge_id,
                phone,
                code,
                expires_at,
                verified,
                attempts,
                created_at
            FROM otp_challenges
            WHERE phone = $1 AND verified = false
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OtpChallengeRow::into_challenge))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM otp_challenges WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn create_account(&self, account: &Account) -> AuthResult<CreateAccount> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                phone,
                credential_hash,
                confirmed,
                created_at,
                updated_at,
                last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (phone) DO NOTHING
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.phone.as_str())
        .bind(account.credential_hash.as_phc_string())
        .bind(account.confirmed)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.last_login_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(if inserted == 1 {
            CreateAccount::Created
        } else {
            CreateAccount::AlreadyExists
        })
    }

    async fn find_account_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                phone,
                credential_hash,
                confirmed,
                created_at,
                updated_at,
                last_login_at
            FROM accounts
            WHERE phone = $1
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn update_account(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                credential_hash = $2,
                confirmed = $3,
                updated_at = $4,
                last_login_at = $5
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.credential_hash.as_phc_string())
        .bind(account.confirmed)
        .bind(account.updated_at)
        .bind(account.last_login_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                account_id,
                expires_at_ms,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id)
        .bind(session.account_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                account_id,
                expires_at_ms,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthSessionRow::into_session))
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms <= $1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Rate Limit Store Implementation
// ============================================================================

impl RateLimitStore for PgAuthRepository {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        let window_start = config.window_start_ms(now_ms);

        let row: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO otp_rate_limits (rate_key, window_start_ms, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (rate_key, window_start_ms)
            DO UPDATE SET request_count = otp_rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(config.evaluate(row.0.max(0) as u32, now_ms))
    }
}

// ============================================================================
// Internal row types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct OtpChallengeRow {
    challenge_id: Uuid,
    phone: String,
    code: String,
    expires_at: DateTime<Utc>,
    verified: bool,
    attempts: i32,
    created_at: DateTime<Utc>,
}

impl OtpChallengeRow {
    fn into_challenge(self) -> OtpChallenge {
        OtpChallenge {
            challenge_id: ChallengeId::from_uuid(self.challenge_id),
            phone: Phone::from_db(self.phone),
            code: OtpCode::from_db(self.code),
            expires_at: self.expires_at,
            verified: self.verified,
            attempts: self.attempts.max(0) as u32,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    phone: String,
    credential_hash: String,
    confirmed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let credential_hash = CredentialHash::from_phc_string(self.credential_hash)
            .map_err(|e| AuthError::Internal(format!("Corrupt credential hash: {e}")))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            phone: Phone::from_db(self.phone),
            credential_hash,
            confirmed: self.confirmed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    account_id: Uuid,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: self.session_id,
            account_id: AccountId::from_uuid(self.account_id),
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}
