//! Application Configuration
//!
//! Configuration for the Enrollment application layer.

use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct EnrollmentConfig {
    /// HMAC key of replace-confirmation tokens (32 bytes)
    pub confirmation_secret: [u8; 32],
    /// Replace-confirmation token validity
    pub confirmation_ttl: Duration,
    /// Require a matching token with `replaceActive=true`
    pub require_confirmation_token: bool,
    /// Bearer secret of the cron endpoint. Unset rejects every call.
    pub cron_secret: Option<String>,
    /// Re-plan attempts when the active set moves under a join
    pub join_max_attempts: u32,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            confirmation_secret: [0u8; 32],
            confirmation_ttl: Duration::from_secs(10 * 60),
            require_confirmation_token: true,
            cron_secret: None,
            join_max_attempts: 3,
        }
    }
}

impl EnrollmentConfig {
    /// Create config with a random confirmation secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            confirmation_secret: platform::crypto::random_key(),
            ..Default::default()
        }
    }

    pub fn confirmation_ttl_ms(&self) -> i64 {
        self.confirmation_ttl.as_millis() as i64
    }
}

impl fmt::Debug for EnrollmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentConfig")
            .field("confirmation_secret", &"[REDACTED]")
            .field("confirmation_ttl", &self.confirmation_ttl)
            .field("require_confirmation_token", &self.require_confirmation_token)
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[REDACTED]"))
            .field("join_max_attempts", &self.join_max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrollmentConfig::default();
        assert_eq!(config.confirmation_ttl_ms(), 600_000);
        assert!(config.require_confirmation_token);
        assert!(config.cron_secret.is_none());
    }

    #[test]
    fn test_debug_redacts() {
        let config = EnrollmentConfig {
            cron_secret: Some("s3cr3t".into()),
            ..EnrollmentConfig::with_random_secret()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
    }
}
