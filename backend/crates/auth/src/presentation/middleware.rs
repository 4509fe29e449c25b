//! Auth Middleware
//!
//! Middleware for requiring authentication on protected routes. On success
//! the resolved [`CurrentAccount`] is inserted into request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::principal::CurrentAccount;
use std::sync::Arc;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::AuthSessionRepository;
use crate::error::AuthError;

/// Middleware state
pub struct AuthMiddlewareState<R>
where
    R: AuthSessionRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthMiddlewareState<R>
where
    R: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }
}

impl<R> Clone for AuthMiddlewareState<R>
where
    R: AuthSessionRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

/// Middleware that requires a valid auth session
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_auth_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthSessionRepository + Send + Sync + 'static,
{
    let Some(token) =
        platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name)
    else {
        return AuthError::SessionInvalid.into_response();
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());

    match use_case.get_session(&token).await {
        Ok(session) => {
            req.extensions_mut()
                .insert(CurrentAccount::new(session.account_id));
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
