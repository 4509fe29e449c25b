//! Enrollment Routers
//!
//! Three routers so the binary can layer them differently:
//! - [`member_router`]: needs `CurrentAccount` in request extensions
//!   (wrap with the auth session middleware)
//! - [`catalogue_router`]: public discipline catalogue
//! - [`cron_router`]: bearer-secret protected maintenance

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::EnrollmentConfig;
use crate::domain::repository::EnrollmentStore;
use crate::presentation::handlers::{self, EnrollmentAppState};

fn state<R: EnrollmentStore>(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> EnrollmentAppState<R> {
    EnrollmentAppState { repo, config }
}

pub fn member_router<R>(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Router
where
    R: EnrollmentStore,
{
    Router::new()
        .route("/disciplines/join", post(handlers::join_discipline::<R>))
        .route("/disciplines/stop", post(handlers::stop_discipline::<R>))
        .route("/enrollments/active", get(handlers::active_enrollment::<R>))
        .route("/subscription/access", get(handlers::subscription_access::<R>))
        .with_state(state(repo, config))
}

pub fn catalogue_router<R>(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Router
where
    R: EnrollmentStore,
{
    Router::new()
        .route("/disciplines", get(handlers::list_disciplines::<R>))
        .route("/disciplines/{slug}", get(handlers::get_discipline::<R>))
        .with_state(state(repo, config))
}

pub fn cron_router<R>(repo: Arc<R>, config: Arc<EnrollmentConfig>) -> Router
where
    R: EnrollmentStore,
{
    Router::new()
        .route(
            "/cron/expire-subscriptions",
            get(handlers::expire_subscriptions::<R>),
        )
        .with_state(state(repo, config))
}
