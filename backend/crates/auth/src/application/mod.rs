//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod housekeeping;
pub mod identity_binder;
pub mod request_otp;
pub mod session_token;
pub mod sign_out;
pub mod verify_otp;

// Re-exports
pub use check_session::{CheckSessionUseCase, SessionInfoOutput};
pub use config::AuthConfig;
pub use housekeeping::{AuthHousekeepingReport, AuthHousekeepingUseCase};
pub use identity_binder::{BindingOutput, IdentityBinder};
pub use request_otp::{Delivery, RequestOtpOutput, RequestOtpUseCase};
pub use sign_out::SignOutUseCase;
pub use verify_otp::{VerifyOtpInput, VerifyOtpUseCase};
