//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::credential::CredentialError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Generic message for every failed verification
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired code";

const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required request field absent or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Request body is not valid JSON
    #[error("Malformed request body")]
    MalformedBody,

    /// Normalized phone is not `+` and 10 to 15 digits
    #[error("Invalid phone number")]
    InvalidPhone,

    /// Too many OTP requests for one phone in the current window
    #[error("Too many code requests. Please wait before trying again.")]
    RateLimited,

    /// Wrong, expired, superseded or unknown code. Never more specific.
    #[error("Invalid or expired code")]
    InvalidCode,

    /// Session cookie missing, forged or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// OTP verified and account bound, but no session could be created
    #[error("Session establishment failed: {0}")]
    SessionEstablishment(String),

    /// Credential derivation or hashing failed
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingField(_) | AuthError::MalformedBody | AuthError::InvalidPhone => {
                ErrorKind::BadRequest
            }
            AuthError::RateLimited => ErrorKind::TooManyRequests,
            AuthError::InvalidCode | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::Database(sqlx::Error::PoolTimedOut) => ErrorKind::ServiceUnavailable,
            AuthError::SessionEstablishment(_)
            | AuthError::Credential(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError. Server-side detail never reaches the body.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::SessionEstablishment(_) => {
                AppError::new(self.kind(), "Sign-in failed. Please try again.")
                    .with_code("SESSION_ESTABLISHMENT_FAILED")
                    .with_action("Request a new code and sign in again")
            }
            AuthError::RateLimited => {
                AppError::new(self.kind(), self.to_string()).with_code("RATE_LIMITED")
            }
            _ if self.kind().is_server_error() => AppError::new(self.kind(), SERVER_ERROR_MESSAGE),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Credential(e) => {
                tracing::error!(error = %e, "Credential derivation failed");
            }
            AuthError::SessionEstablishment(reason) => {
                tracing::error!(reason = %reason, "Account bound but session not established");
            }
            AuthError::RateLimited => {
                tracing::warn!("OTP request rate limit exceeded");
            }
            AuthError::InvalidCode => {
                tracing::info!("Invalid OTP verification attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::MissingField("phone"), StatusCode::BAD_REQUEST),
            (AuthError::MalformedBody, StatusCode::BAD_REQUEST),
            (AuthError::InvalidPhone, StatusCode::BAD_REQUEST),
            (AuthError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AuthError::InvalidCode, StatusCode::UNAUTHORIZED),
            (AuthError::SessionInvalid, StatusCode::UNAUTHORIZED),
            (
                AuthError::SessionEstablishment("insert failed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AuthError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_invalid_code_message_is_generic() {
        let body = AuthError::InvalidCode.to_app_error().body();
        assert_eq!(body["error"], INVALID_CODE_MESSAGE);
    }

    #[test]
    fn test_server_errors_do_not_leak_detail() {
        let err = AuthError::Internal("connection refused to 10.0.0.5".into());
        let body = err.to_app_error().body();
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[test]
    fn test_session_establishment_is_distinct() {
        let body = AuthError::SessionEstablishment("db down".into())
            .to_app_error()
            .body();
        assert_eq!(body["code"], "SESSION_ESTABLISHMENT_FAILED");
        assert_ne!(body["error"], INVALID_CODE_MESSAGE);
    }
}
