//! Discipline Catalogue Use Case

use std::sync::Arc;

use crate::domain::entity::discipline::Discipline;
use crate::domain::repository::DisciplineRepository;
use crate::domain::value_object::slug::Slug;
use crate::error::{EnrollmentError, EnrollmentResult};

pub struct CatalogueUseCase<R>
where
    R: DisciplineRepository,
{
    repo: Arc<R>,
}

impl<R> CatalogueUseCase<R>
where
    R: DisciplineRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> EnrollmentResult<Vec<Discipline>> {
        self.repo.list_disciplines().await
    }

    /// A malformed slug is reported as not found without a lookup
    pub async fn get_by_slug(&self, raw_slug: &str) -> EnrollmentResult<Discipline> {
        let slug = Slug::parse(raw_slug).ok_or(EnrollmentError::DisciplineNotFound)?;

        self.repo
            .find_discipline_by_slug(&slug)
            .await?
            .ok_or(EnrollmentError::DisciplineNotFound)
    }
}
