//! Server configuration from the environment
//!
//! Release builds refuse to start without the secrets. Debug builds fall
//! back to random keys and development cookie settings.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, WhatsAppConfig};
use axum::http::HeaderValue;
use enrollment::EnrollmentConfig;
use platform::cookie::SameSite;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_HOUSEKEEPING_INTERVAL_SECS: u64 = 3600;

pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<HeaderValue>,
    pub housekeeping_interval: Duration,
    pub whatsapp: Option<WhatsAppConfig>,
    pub auth: AuthConfig,
    pub enrollment: EnrollmentConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = var_or("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let housekeeping_interval = match optional_var("HOUSEKEEPING_INTERVAL_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .context("HOUSEKEEPING_INTERVAL_SECS is not a number")?,
            ),
            None => Duration::from_secs(DEFAULT_HOUSEKEEPING_INTERVAL_SECS),
        };

        let whatsapp = match (optional_var("WHATSAPP_TOKEN"), optional_var("WHATSAPP_NUMBER_ID")) {
            (Some(token), Some(number_id)) => Some(WhatsAppConfig::new(token, number_id)),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins: parse_origins(&var_or("FRONTEND_ORIGINS", DEFAULT_FRONTEND_ORIGINS)),
            housekeeping_interval,
            whatsapp,
            auth: auth_config()?,
            enrollment: enrollment_config()?,
        })
    }
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    match optional_var("CREDENTIAL_SECRET") {
        Some(secret) => config.credential_secret = secret.into_bytes(),
        None if !cfg!(debug_assertions) => bail!("CREDENTIAL_SECRET must be set in production"),
        None => tracing::warn!(
            "CREDENTIAL_SECRET not set, using a random key; stored credentials stop verifying after a restart and are re-issued on next sign-in"
        ),
    }
    config.credential_pepper = optional_var("CREDENTIAL_PEPPER").map(String::into_bytes);

    match optional_var("SESSION_SECRET") {
        Some(secret) => {
            config.session_secret = platform::crypto::decode_key(&secret)
                .context("SESSION_SECRET must be 32 bytes of standard base64")?;
        }
        None if !cfg!(debug_assertions) => bail!("SESSION_SECRET must be set in production"),
        None => {}
    }

    if let Some(same_site) = optional_var("COOKIE_SAME_SITE") {
        config.cookie_same_site = parse_same_site(&same_site)?;
    }

    if let Some(code) = optional_var("DEFAULT_COUNTRY_CODE") {
        config.default_country_code = code;
    }
    config.testing_mode = parse_flag(optional_var("IS_TESTING").as_deref());
    if let Some(disclose) = optional_var("OTP_DISCLOSE_ON_FAILURE") {
        config.disclose_on_delivery_failure = parse_flag(Some(&disclose));
    }

    if config.testing_mode {
        tracing::warn!("IS_TESTING enabled: OTP delivery skipped and codes disclosed");
    }

    Ok(config)
}

fn enrollment_config() -> anyhow::Result<EnrollmentConfig> {
    let mut config = EnrollmentConfig::with_random_secret();

    match optional_var("CONFIRMATION_SECRET") {
        Some(secret) => {
            config.confirmation_secret = platform::crypto::decode_key(&secret)
                .context("CONFIRMATION_SECRET must be 32 bytes of standard base64")?;
        }
        None if !cfg!(debug_assertions) => bail!("CONFIRMATION_SECRET must be set in production"),
        None => {}
    }

    config.cron_secret = optional_var("CRON_SECRET");
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, cron endpoints reject every call");
    }

    Ok(config)
}

/// Unset and blank are the same
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    optional_var(name).unwrap_or_else(|| default.to_string())
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_same_site(raw: &str) -> anyhow::Result<SameSite> {
    let same_site =
        SameSite::parse(raw).with_context(|| format!("COOKIE_SAME_SITE has unknown policy {raw:?}"))?;
    if same_site == SameSite::None {
        tracing::warn!("COOKIE_SAME_SITE=None sends the session cookie on cross-site requests");
    }
    Ok(same_site)
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect()
}
