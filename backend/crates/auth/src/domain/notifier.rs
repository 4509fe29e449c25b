//! Notifier Port
//!
//! Out-of-band delivery of OTP codes and welcome messages. Implemented in
//! `infra::whatsapp`. Callers treat failures as non-fatal: OTP issuance
//! falls back to disclosure, welcome messages are fire-and-forget.

use thiserror::Error;

use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};

#[derive(Debug, Error)]
pub enum NotifierError {
    /// Channel credentials are missing
    #[error("Notifier is not configured")]
    NotConfigured,

    /// Request never reached the provider or the response was unreadable
    #[error("Notifier transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Notifier rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send_code(&self, phone: &Phone, code: &OtpCode) -> Result<(), NotifierError>;

    async fn send_welcome(&self, phone: &Phone) -> Result<(), NotifierError>;
}
