//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::application::AuthHousekeepingUseCase;
use auth::middleware::{AuthMiddlewareState, require_auth_session};
use auth::{AuthConfig, PgAuthRepository, WhatsAppNotifier, auth_router};
use axum::{
    Router,
    http::{Method, header},
    middleware,
};
use chrono::Utc;
use enrollment::application::EnrollmentHousekeepingUseCase;
use enrollment::{
    EnrollmentConfig, PgEnrollmentRepository, catalogue_router, cron_router, member_router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,enrollment=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = ServerConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&server.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let auth_repo = Arc::new(PgAuthRepository::new(pool.clone()));
    let enrollment_repo = Arc::new(PgEnrollmentRepository::new(pool.clone()));
    let notifier = Arc::new(WhatsAppNotifier::new(server.whatsapp.clone())?);
    let auth_config = Arc::new(server.auth);
    let enrollment_config = Arc::new(server.enrollment);

    if !notifier.is_configured() {
        tracing::warn!("WhatsApp credentials not set, OTP delivery will fail");
    }

    // Startup cleanup, then periodic. Errors never stop the server.
    let housekeeping = Housekeeping {
        auth_repo: auth_repo.clone(),
        enrollment_repo: enrollment_repo.clone(),
        auth_config: auth_config.clone(),
        enrollment_config: enrollment_config.clone(),
    };
    housekeeping.run().await;
    tokio::spawn(housekeeping.run_every(server.housekeeping_interval));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(server.frontend_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Member routes resolve the session cookie into `CurrentAccount`
    let session_layer = middleware::from_fn_with_state(
        AuthMiddlewareState::new(auth_repo.clone(), auth_config.clone()),
        require_auth_session::<PgAuthRepository>,
    );

    let api = member_router(enrollment_repo.clone(), enrollment_config.clone())
        .route_layer(session_layer)
        .merge(catalogue_router(
            enrollment_repo.clone(),
            enrollment_config.clone(),
        ))
        .merge(cron_router(enrollment_repo, enrollment_config));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_repo, notifier, auth_config))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", server.bind_addr);

    let listener = TcpListener::bind(server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[derive(Clone)]
struct Housekeeping {
    auth_repo: Arc<PgAuthRepository>,
    enrollment_repo: Arc<PgEnrollmentRepository>,
    auth_config: Arc<AuthConfig>,
    enrollment_config: Arc<EnrollmentConfig>,
}

impl Housekeeping {
    async fn run(&self) {
        let now = Utc::now();

        if let Err(e) = AuthHousekeepingUseCase::new(self.auth_repo.clone())
            .execute(now)
            .await
        {
            tracing::warn!(error = %e, "Auth housekeeping failed, continuing anyway");
        }

        let window_ms = self.auth_config.otp_rate_limit.window_ms();
        match self
            .auth_repo
            .purge_rate_limits(now.timestamp_millis() - window_ms)
            .await
        {
            Ok(deleted) => tracing::info!(rate_limits_deleted = deleted, "Rate limit cleanup completed"),
            Err(e) => tracing::warn!(error = %e, "Rate limit cleanup failed, continuing anyway"),
        }

        if let Err(e) = EnrollmentHousekeepingUseCase::new(
            self.enrollment_repo.clone(),
            self.enrollment_config.clone(),
        )
        .execute(now)
        .await
        {
            tracing::warn!(error = %e, "Enrollment housekeeping failed, continuing anyway");
        }
    }

    async fn run_every(self, period: std::time::Duration) {
        let mut interval = tokio::time::interval(period.max(std::time::Duration::from_secs(1)));
        // First tick fires immediately; startup already ran
        interval.tick().await;
        loop {
            interval.tick().await;
            self.run().await;
        }
    }
}
