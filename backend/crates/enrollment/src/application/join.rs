//! Join Discipline Use Case
//!
//! 1. Validate input, then consult the access gate.
//! 2. Plan against the account's active enrollments.
//! 3. Apply the plan atomically; if the active set moved in between,
//!    re-plan (bounded by `join_max_attempts`).
//!
//! Replacing another discipline is a two-phase handshake: the first call
//! fails with `ActiveDisciplineExists` carrying a confirmation token, the
//! second call presents that token with `replace_active = true`.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{AccountId, DisciplineId};

use crate::application::config::EnrollmentConfig;
use crate::application::replace_token::{ReplaceBinding, issue_replace_token, verify_replace_token};
use crate::domain::access_gate;
use crate::domain::entity::enrollment::Enrollment;
use crate::domain::repository::{
    DisciplineRepository, EnrollmentRepository, StartEnrollment, SubscriptionRepository,
};
use crate::domain::services::{JoinPlan, enrollment_ids, plan_join};
use crate::error::{EnrollmentError, EnrollmentResult};

#[derive(Debug, Clone, Copy)]
pub struct JoinInput<'a> {
    pub account_id: AccountId,
    pub discipline_id: Option<&'a str>,
    pub replace_active: bool,
    pub confirmation_token: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined {
        enrollment: Enrollment,
        /// Enrollments stopped to make room, with their `stopped_at` set
        replaced: Vec<Enrollment>,
    },
    /// Idempotent success: no record written, no counter change
    AlreadyJoined(Enrollment),
}

pub struct JoinDisciplineUseCase<R>
where
    R: DisciplineRepository + EnrollmentRepository + SubscriptionRepository,
{
    repo: Arc<R>,
    config: Arc<EnrollmentConfig>,
}

impl<R> JoinDisciplineUseCase<R>
where
    R: DisciplineRepository + EnrollmentRepository + SubscriptionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: JoinInput<'_>) -> EnrollmentResult<JoinOutcome> {
        let discipline_id = parse_discipline_id(input.discipline_id)?;
        let account_id = input.account_id;

        let subscription = self.repo.find_latest_subscription(&account_id).await?;
        let decision = access_gate::evaluate(subscription.as_ref());
        if !decision.has_access {
            tracing::info!(
                account_id = %account_id,
                status = %decision.status,
                "Join rejected by access gate"
            );
            return Err(EnrollmentError::AccessDenied);
        }

        if self.repo.find_discipline_by_id(&discipline_id).await?.is_none() {
            return Err(EnrollmentError::DisciplineNotFound);
        }

        for attempt in 1..=self.config.join_max_attempts.max(1) {
            let active = self.repo.list_active_enrollments(&account_id).await?;

            let replacing = match plan_join(&active, discipline_id, input.replace_active) {
                JoinPlan::AlreadyJoined(existing) => {
                    tracing::debug!(
                        account_id = %account_id,
                        discipline_id = %discipline_id,
                        "Already joined"
                    );
                    return Ok(JoinOutcome::AlreadyJoined(existing));
                }
                JoinPlan::NeedsConfirmation { active } => {
                    return Err(self.confirmation_required(account_id, discipline_id, &active));
                }
                JoinPlan::Start { replacing } => replacing,
            };

            let expected = enrollment_ids(&replacing);

            if !replacing.is_empty() && self.config.require_confirmation_token {
                let binding = ReplaceBinding {
                    account_id,
                    discipline_id,
                    active: &expected,
                };
                let confirmed = input.confirmation_token.is_some_and(|token| {
                    verify_replace_token(
                        &self.config.confirmation_secret,
                        token,
                        binding,
                        Utc::now().timestamp_millis(),
                    )
                });
                if !confirmed {
                    tracing::info!(
                        account_id = %account_id,
                        discipline_id = %discipline_id,
                        "Replace requested without a matching confirmation token"
                    );
                    return Err(self.confirmation_required(account_id, discipline_id, &replacing));
                }
            }

            let enrollment = Enrollment::start(account_id, discipline_id, Utc::now());

            match self.repo.start_enrollment(&enrollment, &expected).await? {
                StartEnrollment::Started { replaced } => {
                    for stopped in &replaced {
                        tracing::info!(
                            account_id = %account_id,
                            discipline_id = %stopped.discipline_id,
                            enrollment_id = %stopped.enrollment_id,
                            "Enrollment replaced"
                        );
                    }
                    tracing::info!(
                        account_id = %account_id,
                        discipline_id = %discipline_id,
                        enrollment_id = %enrollment.enrollment_id,
                        "Joined discipline"
                    );
                    return Ok(JoinOutcome::Joined {
                        enrollment,
                        replaced,
                    });
                }
                StartEnrollment::AlreadyActive(existing) => {
                    return Ok(JoinOutcome::AlreadyJoined(existing));
                }
                StartEnrollment::Stale { .. } => {
                    tracing::debug!(
                        account_id = %account_id,
                        attempt = attempt,
                        "Active enrollments changed during join, re-planning"
                    );
                }
            }
        }

        Err(EnrollmentError::Contended)
    }

    fn confirmation_required(
        &self,
        account_id: AccountId,
        discipline_id: DisciplineId,
        active: &[Enrollment],
    ) -> EnrollmentError {
        let ids = enrollment_ids(active);
        let binding = ReplaceBinding {
            account_id,
            discipline_id,
            active: &ids,
        };
        let expires_at_ms = Utc::now().timestamp_millis() + self.config.confirmation_ttl_ms();

        EnrollmentError::ActiveDisciplineExists {
            confirmation_token: issue_replace_token(
                &self.config.confirmation_secret,
                binding,
                expires_at_ms,
            ),
            active_discipline_ids: active.iter().map(|e| e.discipline_id).collect(),
        }
    }
}

/// Shared by join and stop: absent or blank → missing, unparsable → invalid
pub(crate) fn parse_discipline_id(raw: Option<&str>) -> EnrollmentResult<DisciplineId> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(EnrollmentError::MissingField("disciplineId"))?
        .parse()
        .map_err(|_| EnrollmentError::InvalidField("disciplineId"))
}
