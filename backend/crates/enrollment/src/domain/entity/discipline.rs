//! Discipline Entity
//!
//! Curated challenge program. Read-mostly; the only field this crate writes
//! is the `subscribers` display counter.

use chrono::{DateTime, Utc};
use kernel::id::DisciplineId;

use crate::domain::value_object::slug::Slug;

#[derive(Debug, Clone)]
pub struct Discipline {
    pub discipline_id: DisciplineId,
    pub slug: Slug,
    pub title: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub length_days: Option<i32>,
    /// Active enrollments referencing this discipline (eventually consistent)
    pub subscribers: i64,
    pub tag: Option<String>,
    pub img_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Discipline {
    pub fn new(slug: Slug, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            discipline_id: DisciplineId::new(),
            slug,
            title: Some(title.into()),
            short_desc: None,
            long_desc: None,
            length_days: None,
            subscribers: 0,
            tag: None,
            img_url: None,
            metadata: None,
            created_at: now,
        }
    }

    pub fn with_length_days(mut self, days: i32) -> Self {
        self.length_days = Some(days);
        self
    }
}
