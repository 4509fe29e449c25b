//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckSessionUseCase, RequestOtpUseCase, SignOutUseCase, VerifyOtpInput, VerifyOtpUseCase,
};
use crate::domain::notifier::Notifier;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    RequestOtpRequest, RequestOtpResponse, SessionStatusResponse, VerifyOtpRequest,
    VerifyOtpResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, N>
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<AuthConfig>,
}

impl<R, N> Clone for AuthAppState<R, N>
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// OTP
// ============================================================================

/// POST /api/auth/request-otp
pub async fn request_otp<R, N>(
    State(state): State<AuthAppState<R, N>>,
    payload: Result<Json<RequestOtpRequest>, JsonRejection>,
) -> AuthResult<Json<RequestOtpResponse>>
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    let Json(req) = payload.map_err(|_| AuthError::MalformedBody)?;

    let use_case =
        RequestOtpUseCase::new(state.repo.clone(), state.notifier.clone(), state.config.clone());

    let output = use_case.execute(req.phone.as_deref()).await?;

    Ok(Json(RequestOtpResponse {
        success: true,
        message: output.message().to_string(),
        phone: output.phone.as_str().to_string(),
        debug_otp: output.debug_otp,
    }))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp<R, N>(
    State(state): State<AuthAppState<R, N>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    let Json(req) = payload.map_err(|_| AuthError::MalformedBody)?;

    let use_case =
        VerifyOtpUseCase::new(state.repo.clone(), state.notifier.clone(), state.config.clone());

    let output = use_case
        .execute(VerifyOtpInput {
            phone: req.phone.as_deref(),
            code: req.otp.as_deref(),
        })
        .await?;

    let cookie = platform::cookie::set_cookie_header(&state.config.session_cookie(), &output.session_token)
        .ok_or_else(|| AuthError::SessionEstablishment("session cookie is not a valid header".into()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(VerifyOtpResponse {
            success: true,
            is_new_user: output.is_new_user,
            message: if output.is_new_user {
                "Account created".to_string()
            } else {
                "Signed in".to_string()
            },
        }),
    ))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    if let Some(token) = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign out with invalid session");
        }
    }

    let cookie = state.config.session_cookie().build_delete_cookie();

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name);

    let session_info = match token {
        Some(token) => CheckSessionUseCase::new(state.repo.clone(), state.config.clone())
            .execute(&token)
            .await
            .ok(),
        None => None,
    };

    match session_info {
        Some(info) => Json(SessionStatusResponse {
            authenticated: true,
            account_id: Some(info.account_id.to_string()),
            expires_at_ms: Some(info.expires_at_ms),
        }),
        None => Json(SessionStatusResponse {
            authenticated: false,
            account_id: None,
            expires_at_ms: None,
        }),
    }
}
