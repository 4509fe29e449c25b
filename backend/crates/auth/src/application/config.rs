//! Application Configuration
//!
//! Configuration for the Auth application layer. Built once by the binary
//! from the environment and shared as `Arc<AuthConfig>`.

use std::fmt;
use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::rate_limit::RateLimitConfig;

use crate::domain::value_object::phone::DEFAULT_COUNTRY_CODE;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Prepended to phone input that has no international prefix
    pub default_country_code: String,
    /// OTP validity (5 minutes)
    pub otp_ttl: Duration,
    /// OTP requests per phone per window
    pub otp_rate_limit: RateLimitConfig,
    /// Key of the derived credential (root secret)
    pub credential_secret: Vec<u8>,
    /// Optional pepper for the stored credential hash
    pub credential_pepper: Option<Vec<u8>>,
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL, extended on activity (30 days)
    pub session_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Skip delivery and disclose codes (`IS_TESTING`)
    pub testing_mode: bool,
    /// Disclose the code in the response when delivery fails
    pub disclose_on_delivery_failure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            otp_ttl: Duration::from_secs(5 * 60),
            otp_rate_limit: RateLimitConfig::new(5, 10 * 60),
            credential_secret: Vec::new(),
            credential_pepper: None,
            session_cookie_name: "dfit_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl: Duration::from_secs(30 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            testing_mode: false,
            disclose_on_delivery_failure: false,
        }
    }
}

impl AuthConfig {
    /// Create config with random secrets (for development)
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::random_key(),
            credential_secret: platform::crypto::random_key().to_vec(),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, disclosure fallback)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            disclose_on_delivery_failure: true,
            ..Self::with_random_secret()
        }
    }

    pub fn otp_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.otp_ttl).unwrap_or_else(|_| chrono::Duration::minutes(5))
    }

    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl).unwrap_or_else(|_| chrono::Duration::days(30))
    }

    /// Get credential pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.credential_pepper.as_deref()
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig::session(
            self.session_cookie_name.clone(),
            self.cookie_secure,
            self.cookie_same_site,
            self.session_ttl.as_secs() as i64,
        )
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("default_country_code", &self.default_country_code)
            .field("otp_ttl", &self.otp_ttl)
            .field("otp_rate_limit", &self.otp_rate_limit)
            .field("credential_secret", &"[REDACTED]")
            .field("credential_pepper", &self.credential_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl", &self.session_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("testing_mode", &self.testing_mode)
            .field("disclose_on_delivery_failure", &self.disclose_on_delivery_failure)
            .finish()
    }
}
