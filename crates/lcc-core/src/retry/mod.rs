//! Response classification and retry/backoff decisions.
//!
//! The [`RetryDecisionEngine`] turns one completed exchange into exactly one
//! [`Verdict`]: retry after a delay, or a non-retriable outcome (ok, ignore,
//! fail). [`send_with_retry`] is the calling loop that acts on verdicts,
//! bounded by a [`RetryPolicy`], so retrievers share one consistent policy.

mod backoff;
mod classify;
mod error;
mod policy;
mod run;

pub use backoff::{BackoffConfig, DEFAULT_BACKOFF_SECS, DEFAULT_RATE_LIMIT_RESET_HEADER, RETRY_AFTER_HEADER};
pub use classify::{is_retryable_status, RetryDecisionEngine};
pub use error::{RequestError, TransportError};
pub use policy::{NonRetriable, RetryDecision, RetryPolicy, Verdict, MAX_RETRY_DELAY_SECS};
pub use run::{send_with_retry, Sleeper, ThreadSleeper};
