//! Enrollment Error Types
//!
//! This module provides enrollment-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::DisciplineId;
use thiserror::Error;

/// Enrollment-specific result type alias
pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

/// Machine-readable code of the replace-confirmation conflict
pub const ACTIVE_DISCIPLINE_EXISTS: &str = "ACTIVE_DISCIPLINE_EXISTS";

const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Required request field absent or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Field present but not parseable
    #[error("{0} is invalid")]
    InvalidField(&'static str),

    /// Request body is not valid JSON
    #[error("Malformed request body")]
    MalformedBody,

    /// No access-granting subscription
    #[error("access denied")]
    AccessDenied,

    /// Another discipline is active; the caller must confirm replacement
    #[error("Another discipline is already active")]
    ActiveDisciplineExists {
        confirmation_token: String,
        active_discipline_ids: Vec<DisciplineId>,
    },

    #[error("Discipline not found")]
    DisciplineNotFound,

    /// `stop` without an active enrollment for the pair
    #[error("No active enrollment for this discipline")]
    NotEnrolled,

    /// Missing or wrong cron bearer secret
    #[error("Unauthorized")]
    CronUnauthorized,

    /// The active set kept changing under concurrent requests
    #[error("Enrollment changed concurrently")]
    Contended,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnrollmentError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnrollmentError::MissingField(_)
            | EnrollmentError::InvalidField(_)
            | EnrollmentError::MalformedBody => ErrorKind::BadRequest,
            EnrollmentError::AccessDenied => ErrorKind::Forbidden,
            EnrollmentError::ActiveDisciplineExists { .. } => ErrorKind::Conflict,
            EnrollmentError::DisciplineNotFound | EnrollmentError::NotEnrolled => {
                ErrorKind::NotFound
            }
            EnrollmentError::CronUnauthorized => ErrorKind::Unauthorized,
            EnrollmentError::Contended => ErrorKind::ServiceUnavailable,
            EnrollmentError::Database(sqlx::Error::PoolTimedOut) => ErrorKind::ServiceUnavailable,
            EnrollmentError::Database(_) | EnrollmentError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Server-side detail never reaches the body.
    pub fn to_app_error(&self) -> AppError {
        match self {
            EnrollmentError::AccessDenied => AppError::new(self.kind(), self.to_string())
                .with_code("SUBSCRIPTION_REQUIRED")
                .with_action("Subscribe to join a discipline"),
            EnrollmentError::ActiveDisciplineExists {
                confirmation_token,
                active_discipline_ids,
            } => AppError::new(self.kind(), self.to_string())
                .with_code(ACTIVE_DISCIPLINE_EXISTS)
                .with_action("Confirm to stop your current discipline and join this one")
                .with_detail("confirmationToken", confirmation_token.clone())
                .with_detail(
                    "activeDisciplineIds",
                    active_discipline_ids
                        .iter()
                        .map(|id| serde_json::Value::from(id.to_string()))
                        .collect::<Vec<_>>(),
                ),
            EnrollmentError::Contended => AppError::new(
                self.kind(),
                "Enrollment changed in the meantime. Please try again.",
            ),
            _ if self.kind().is_server_error() => AppError::new(self.kind(), SERVER_ERROR_MESSAGE),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            EnrollmentError::Database(e) => {
                tracing::error!(error = %e, "Enrollment database error");
            }
            EnrollmentError::Internal(msg) => {
                tracing::error!(message = %msg, "Enrollment internal error");
            }
            EnrollmentError::Contended => {
                tracing::warn!("Enrollment retries exhausted");
            }
            EnrollmentError::CronUnauthorized => {
                tracing::warn!("Unauthorized cron invocation");
            }
            _ => {
                tracing::debug!(error = %self, "Enrollment error");
            }
        }
    }
}

impl IntoResponse for EnrollmentError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for EnrollmentError {
    fn from(err: AppError) -> Self {
        EnrollmentError::Internal(err.to_string())
    }
}
