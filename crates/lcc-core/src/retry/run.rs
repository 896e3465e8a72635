//! Retry loop: issue a request until the engine's verdict is final.

use super::classify::RetryDecisionEngine;
use super::error::{RequestError, TransportError};
use super::policy::{NonRetriable, RetryDecision, RetryPolicy, Verdict};
use crate::exchange::Exchange;
use std::time::Duration;

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Issues `send` until the engine returns a non-retriable verdict or the
/// policy's attempt budget is spent.
///
/// Returns `Some(exchange)` for ok responses and `None` for ignored ones.
/// Transport failures count as retryable and wait the engine's default backoff.
pub fn send_with_retry<F>(
    engine: &RetryDecisionEngine,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut send: F,
) -> Result<Option<Exchange>, RequestError>
where
    F: FnMut() -> Result<Exchange, TransportError>,
{
    let mut attempt = 1u32;
    loop {
        let (delay_secs, last) = match send() {
            Ok(exchange) => match engine.classify(&exchange) {
                Verdict::NonRetriable(NonRetriable::Ok) => return Ok(Some(exchange)),
                Verdict::NonRetriable(NonRetriable::Ignore) => {
                    tracing::warn!(
                        status = exchange.status(),
                        "ignoring response: {}",
                        exchange.body()
                    );
                    return Ok(None);
                }
                Verdict::NonRetriable(NonRetriable::Fail) => {
                    return Err(RequestError::failed(exchange.status(), exchange.body()));
                }
                Verdict::Retry(secs) => (secs, format!("HTTP {}", exchange.status())),
            },
            Err(e) => (engine.default_backoff_seconds(), e.to_string()),
        };

        match policy.decide(attempt, delay_secs) {
            RetryDecision::NoRetry => {
                return Err(RequestError::RetriesExhausted {
                    attempts: attempt,
                    last,
                })
            }
            RetryDecision::RetryAfter(d) => {
                tracing::warn!(attempt, "{}; retrying in {:.1}s", last, d.as_secs_f64());
                sleeper.sleep(d);
                attempt += 1;
            }
        }
    }
}
