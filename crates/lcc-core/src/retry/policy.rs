use std::time::Duration;

/// Outcome for an exchange that must not be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonRetriable {
    /// Successful response; pass it through.
    Ok,
    /// Non-fatal failure; drop this exchange's data and carry on.
    Ignore,
    /// Fatal failure; abort the sync.
    Fail,
}

/// The engine's classification of one exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Retry the same request after the given number of seconds (never negative).
    Retry(f64),
    NonRetriable(NonRetriable),
}

impl Verdict {
    pub fn is_retry(&self) -> bool {
        matches!(self, Verdict::Retry(_))
    }
}

/// Longest wait the loop will sleep through; servers asking for more are given up on.
pub const MAX_RETRY_DELAY_SECS: f64 = 86_400.0;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt budget is spent; give up.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounds how many times one request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    /// Decide whether attempt number `attempt` (1-based) may be followed by
    /// another one after `delay_secs`. Delays above [`MAX_RETRY_DELAY_SECS`]
    /// (or not a number) end the retries rather than being shortened.
    pub fn decide(&self, attempt: u32, delay_secs: f64) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        if delay_secs.is_nan() || delay_secs > MAX_RETRY_DELAY_SECS {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(Duration::from_secs_f64(delay_secs.max(0.0)))
    }
}
