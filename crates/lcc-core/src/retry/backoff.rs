//! Backoff computation from response headers.

use crate::clock::Clock;
use crate::exchange::Headers;
use serde::{Deserialize, Serialize};

/// Fallback delay when a retryable response carries no usable timing header.
pub const DEFAULT_BACKOFF_SECS: f64 = 60.0;

pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Header carrying the absolute epoch second at which a rate limit resets.
pub const DEFAULT_RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Backoff parameters (the `[retry]` section of config.toml feeds these).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay in seconds used when neither timing header applies.
    #[serde(default = "default_backoff_secs")]
    pub default_backoff_secs: f64,
    /// Name of the rate-limit reset header (epoch seconds).
    #[serde(default = "default_rate_limit_reset_header")]
    pub rate_limit_reset_header: String,
}

fn default_backoff_secs() -> f64 {
    DEFAULT_BACKOFF_SECS
}

fn default_rate_limit_reset_header() -> String {
    DEFAULT_RATE_LIMIT_RESET_HEADER.to_string()
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            default_backoff_secs: DEFAULT_BACKOFF_SECS,
            rate_limit_reset_header: DEFAULT_RATE_LIMIT_RESET_HEADER.to_string(),
        }
    }
}

impl BackoffConfig {
    /// The configured default, or [`DEFAULT_BACKOFF_SECS`] if it is negative or not finite.
    pub fn effective_default(&self) -> f64 {
        if self.default_backoff_secs.is_finite() && self.default_backoff_secs >= 0.0 {
            self.default_backoff_secs
        } else {
            DEFAULT_BACKOFF_SECS
        }
    }

    /// Seconds to wait before retrying: `Retry-After`, then the rate-limit
    /// reset header relative to `clock`, then the default. Values that do not
    /// parse fall through to the next rule.
    pub fn compute(&self, headers: &Headers, clock: &dyn Clock) -> f64 {
        if let Some(secs) = headers.get(RETRY_AFTER_HEADER).and_then(parse_delay) {
            return secs;
        }
        if let Some(reset) = headers
            .get(&self.rate_limit_reset_header)
            .and_then(parse_timestamp)
        {
            return (reset - clock.now()).max(0.0);
        }
        self.effective_default()
    }
}

/// A delay in seconds: finite and not negative.
fn parse_delay(value: &str) -> Option<f64> {
    parse_timestamp(value).filter(|secs| *secs >= 0.0)
}

fn parse_timestamp(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
