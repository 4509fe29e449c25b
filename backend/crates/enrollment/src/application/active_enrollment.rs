//! Active Enrollment Query

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::entity::{discipline::Discipline, enrollment::Enrollment};
use crate::domain::repository::{DisciplineRepository, EnrollmentRepository};
use crate::error::EnrollmentResult;

#[derive(Debug, Clone)]
pub struct ActiveEnrollmentOutput {
    pub enrollment: Enrollment,
    /// `None` if the discipline was removed from the catalogue
    pub discipline: Option<Discipline>,
}

pub struct ActiveEnrollmentUseCase<R>
where
    R: DisciplineRepository + EnrollmentRepository,
{
    repo: Arc<R>,
}

impl<R> ActiveEnrollmentUseCase<R>
where
    R: DisciplineRepository + EnrollmentRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The account's active enrollment, newest first if several exist
    pub async fn execute(&self, account_id: AccountId) -> EnrollmentResult<Option<ActiveEnrollmentOutput>> {
        let Some(enrollment) = self
            .repo
            .list_active_enrollments(&account_id)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let discipline = self.repo.find_discipline_by_id(&enrollment.discipline_id).await?;

        Ok(Some(ActiveEnrollmentOutput {
            enrollment,
            discipline,
        }))
    }
}
