//! Application Layer
//!
//! Use cases and application services.

pub mod access;
pub mod active_enrollment;
pub mod catalogue;
pub mod config;
pub mod expire_subscriptions;
pub mod housekeeping;
pub mod join;
pub mod replace_token;
pub mod stop;
pub mod subscription_sync;

// Re-exports
pub use access::CheckAccessUseCase;
pub use active_enrollment::{ActiveEnrollmentOutput, ActiveEnrollmentUseCase};
pub use catalogue::CatalogueUseCase;
pub use config::EnrollmentConfig;
pub use expire_subscriptions::{ExpireSubscriptionsUseCase, ExpiryReport};
pub use housekeeping::{EnrollmentHousekeepingReport, EnrollmentHousekeepingUseCase};
pub use join::{JoinDisciplineUseCase, JoinInput, JoinOutcome};
pub use stop::StopDisciplineUseCase;
pub use subscription_sync::SubscriptionSyncUseCase;
