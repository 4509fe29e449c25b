//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the notifier port.

pub mod entity;
pub mod notifier;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{account::Account, auth_session::AuthSession, otp_challenge::OtpChallenge};
pub use notifier::{Notifier, NotifierError};
pub use repository::{AccountRepository, AuthSessionRepository, AuthStore, OtpChallengeRepository};
