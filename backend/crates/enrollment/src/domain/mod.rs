//! Domain Layer
//!
//! Entities, value objects, the access gate, join planning and repository traits.

pub mod access_gate;
pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use access_gate::{AccessDecision, evaluate};
pub use entity::{Discipline, Enrollment, Subscription};
pub use repository::{
    CheckoutRecord, DisciplineRepository, EnrollmentRepository, EnrollmentStore, StartEnrollment,
    SubscriptionRepository,
};
pub use services::{JoinPlan, plan_join};
pub use value_object::{Slug, SubscriptionStatus};
