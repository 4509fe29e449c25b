//! Rate Limiting Infrastructure
//!
//! Fixed-window counters. The policy is pure; storage is behind
//! [`RateLimitStore`] so feature crates can back it with their own tables.

use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Start of the fixed window containing `now_ms`
    pub fn window_start_ms(&self, now_ms: i64) -> i64 {
        let window = self.window_ms().max(1);
        now_ms - now_ms.rem_euclid(window)
    }

    /// Evaluate a post-increment counter value for the window at `now_ms`
    pub fn evaluate(&self, count: u32, now_ms: i64) -> RateLimitResult {
        RateLimitResult {
            allowed: count <= self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_at_ms: self.window_start_ms(now_ms) + self.window_ms(),
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Increment the counter for `key` in the current window and evaluate it
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>>;
}
