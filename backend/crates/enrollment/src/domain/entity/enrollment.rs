//! Enrollment Entity
//!
//! History is append-only: stopping sets `stopped_at`, re-joining creates a
//! new record.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, DisciplineId, EnrollmentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub account_id: AccountId,
    pub discipline_id: DisciplineId,
    pub started_at: DateTime<Utc>,
    /// `None` while active
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn start(account_id: AccountId, discipline_id: DisciplineId, now: DateTime<Utc>) -> Self {
        Self {
            enrollment_id: EnrollmentId::new(),
            account_id,
            discipline_id,
            started_at: now,
            stopped_at: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// No-op on an already stopped record
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_keeps_first_timestamp() {
        let now = Utc::now();
        let mut enrollment = Enrollment::start(AccountId::new(), DisciplineId::new(), now);
        assert!(enrollment.is_active());

        enrollment.stop(now + chrono::Duration::seconds(1));
        enrollment.stop(now + chrono::Duration::seconds(5));
        assert_eq!(enrollment.stopped_at, Some(now + chrono::Duration::seconds(1)));
        assert!(!enrollment.is_active());
    }
}
