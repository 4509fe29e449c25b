//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::notifier::Notifier;
use crate::domain::repository::AuthStore;
use crate::infra::postgres::PgAuthRepository;
use crate::infra::whatsapp::WhatsAppNotifier;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL repository and WhatsApp delivery
pub fn auth_router(
    repo: Arc<PgAuthRepository>,
    notifier: Arc<WhatsAppNotifier>,
    config: Arc<AuthConfig>,
) -> Router {
    auth_router_generic(repo, notifier, config)
}

/// Create a generic Auth router for any repository/notifier implementation
pub fn auth_router_generic<R, N>(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Router
where
    R: AuthStore,
    N: Notifier + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo,
        notifier,
        config,
    };

    Router::new()
        .route("/request-otp", post(handlers::request_otp::<R, N>))
        .route("/verify-otp", post(handlers::verify_otp::<R, N>))
        .route("/signout", post(handlers::sign_out::<R, N>))
        .route("/status", get(handlers::session_status::<R, N>))
        .with_state(state)
}
