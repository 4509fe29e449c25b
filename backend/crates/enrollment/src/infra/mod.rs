//! Infrastructure Layer
//!
//! Database implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryEnrollmentRepository;
pub use postgres::PgEnrollmentRepository;
