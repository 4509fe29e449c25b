//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, notifier port
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations, WhatsApp delivery
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Phone normalization and validation
//! - OTP issuance and single-use verification with 5-minute expiry
//! - Identity binding: one account per canonical phone, no user-facing password
//! - Server-side sessions with HMAC-signed cookie tokens
//!
//! ## Security Model
//! - Verification failures are indistinguishable to the caller
//! - Per-phone OTP operations are serialized (advisory lock / mutex)
//! - Derived credentials are keyed hashes, stored only as Argon2id hashes
//! - OTP request rate limit per phone

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use infra::whatsapp::{WhatsAppConfig, WhatsAppNotifier};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
