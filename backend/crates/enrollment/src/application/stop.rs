//! Stop Discipline Use Case
//!
//! Stopping twice yields `NotEnrolled` the second time.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::AccountId;

use crate::application::join::parse_discipline_id;
use crate::domain::entity::enrollment::Enrollment;
use crate::domain::repository::EnrollmentRepository;
use crate::error::{EnrollmentError, EnrollmentResult};

pub struct StopDisciplineUseCase<R>
where
    R: EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> StopDisciplineUseCase<R>
where
    R: EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        account_id: AccountId,
        discipline_id: Option<&str>,
    ) -> EnrollmentResult<Enrollment> {
        let discipline_id = parse_discipline_id(discipline_id)?;

        let stopped = self
            .repo
            .stop_enrollment(&account_id, &discipline_id, Utc::now())
            .await?
            .ok_or(EnrollmentError::NotEnrolled)?;

        tracing::info!(
            account_id = %account_id,
            discipline_id = %discipline_id,
            enrollment_id = %stopped.enrollment_id,
            "Discipline stopped"
        );

        Ok(stopped)
    }
}
