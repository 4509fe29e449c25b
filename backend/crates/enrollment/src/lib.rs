//! Enrollment Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, access gate, join planning, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Rules
//! - At most one active enrollment per account
//! - Joining requires an active, trialing or past_due subscription
//! - Replacing the active discipline needs an explicit confirmation token
//! - Subscriber counters never go negative and are reconciled periodically

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::EnrollmentConfig;
pub use error::{EnrollmentError, EnrollmentResult};
pub use infra::memory::MemoryEnrollmentRepository;
pub use infra::postgres::PgEnrollmentRepository;
pub use presentation::router::{catalogue_router, cron_router, member_router};
