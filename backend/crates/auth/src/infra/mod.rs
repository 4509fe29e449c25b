//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod memory;
pub mod postgres;
pub mod whatsapp;

pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
pub use whatsapp::{WhatsAppConfig, WhatsAppNotifier};
