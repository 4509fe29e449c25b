//! Presentation Layer
//!
//! HTTP handlers, DTOs and routers.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::EnrollmentAppState;
pub use router::{catalogue_router, cron_router, member_router};
