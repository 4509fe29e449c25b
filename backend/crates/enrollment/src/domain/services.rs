//! Domain Services
//!
//! Pure planning step of `join`. The repository applies the plan atomically
//! and reports back when the state it was computed from has moved.

use kernel::id::{DisciplineId, EnrollmentId};

use crate::domain::entity::enrollment::Enrollment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPlan {
    /// Already active in the target discipline
    AlreadyJoined(Enrollment),
    /// Insert a new enrollment after stopping `replacing` (possibly empty)
    Start { replacing: Vec<Enrollment> },
    /// Other enrollments are active and replacement was not requested
    NeedsConfirmation { active: Vec<Enrollment> },
}

/// Decide what `join` should do given the account's active enrollments.
pub fn plan_join(active: &[Enrollment], target: DisciplineId, replace_active: bool) -> JoinPlan {
    if let Some(existing) = active.iter().find(|e| e.discipline_id == target) {
        return JoinPlan::AlreadyJoined(existing.clone());
    }

    if active.is_empty() || replace_active {
        JoinPlan::Start {
            replacing: active.to_vec(),
        }
    } else {
        JoinPlan::NeedsConfirmation {
            active: active.to_vec(),
        }
    }
}

/// Sorted ids, the canonical form of an active set
pub fn enrollment_ids(enrollments: &[Enrollment]) -> Vec<EnrollmentId> {
    let mut ids: Vec<EnrollmentId> = enrollments.iter().map(|e| e.enrollment_id).collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kernel::id::AccountId;

    #[test]
    fn test_first_join_starts() {
        let plan = plan_join(&[], DisciplineId::new(), false);
        assert_eq!(plan, JoinPlan::Start { replacing: vec![] });
    }

    #[test]
    fn test_same_discipline_is_already_joined() {
        let target = DisciplineId::new();
        let active = vec![Enrollment::start(AccountId::new(), target, Utc::now())];
        assert!(matches!(
            plan_join(&active, target, true),
            JoinPlan::AlreadyJoined(_)
        ));
    }

    #[test]
    fn test_other_discipline_needs_confirmation_unless_replacing() {
        let active = vec![Enrollment::start(AccountId::new(), DisciplineId::new(), Utc::now())];
        let target = DisciplineId::new();

        assert_eq!(
            plan_join(&active, target, false),
            JoinPlan::NeedsConfirmation {
                active: active.clone()
            }
        );
        assert_eq!(
            plan_join(&active, target, true),
            JoinPlan::Start { replacing: active }
        );
    }

    #[test]
    fn test_enrollment_ids_sorted() {
        let account = AccountId::new();
        let a = Enrollment::start(account, DisciplineId::new(), Utc::now());
        let b = Enrollment::start(account, DisciplineId::new(), Utc::now());
        let forward = enrollment_ids(&[a.clone(), b.clone()]);
        let backward = enrollment_ids(&[b, a]);
        assert_eq!(forward, backward);
    }
}
