//! Classify completed exchanges into verdicts.

use super::backoff::BackoffConfig;
use super::policy::{NonRetriable, Verdict};
use crate::clock::{Clock, SystemClock};
use crate::exchange::Exchange;
use crate::filter::{ResponseFilter, ResponseFilterConfig};
use std::sync::Arc;

/// Built-in retryable statuses: 429 Too Many Requests and all 5xx.
pub fn is_retryable_status(code: u16) -> bool {
    matches!(code, 429 | 500..=599)
}

/// Decides, per exchange, between retrying, passing through, ignoring and failing.
///
/// Built once per stream configuration and immutable afterwards, so the same
/// exchange always classifies the same way.
#[derive(Debug, Clone)]
pub struct RetryDecisionEngine {
    retry_filter: Option<ResponseFilter>,
    ignore_filter: Option<ResponseFilter>,
    backoff: BackoffConfig,
    clock: Arc<dyn Clock>,
}

impl Default for RetryDecisionEngine {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl RetryDecisionEngine {
    /// Engine with the given filters, default backoff and the system clock.
    pub fn new(retry_filter: Option<ResponseFilter>, ignore_filter: Option<ResponseFilter>) -> Self {
        Self {
            retry_filter,
            ignore_filter,
            backoff: BackoffConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Engine built from filter configs (predicates that fail to parse never match).
    pub fn from_configs(
        retry_filter: Option<&ResponseFilterConfig>,
        ignore_filter: Option<&ResponseFilterConfig>,
    ) -> Self {
        Self::new(
            retry_filter.map(ResponseFilter::from_config),
            ignore_filter.map(ResponseFilter::from_config),
        )
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Classify one exchange. Rules, first match wins:
    ///
    /// 1. retry filter matches: retry
    /// 2. status is ok: pass through
    /// 3. 429 or 5xx: retry
    /// 4. ignore filter matches: ignore
    /// 5. otherwise: fail
    pub fn classify(&self, exchange: &Exchange) -> Verdict {
        let verdict = if self.filter_matches(&self.retry_filter, exchange) {
            Verdict::Retry(self.backoff_seconds(exchange))
        } else if exchange.ok() {
            Verdict::NonRetriable(NonRetriable::Ok)
        } else if is_retryable_status(exchange.status()) {
            Verdict::Retry(self.backoff_seconds(exchange))
        } else if self.filter_matches(&self.ignore_filter, exchange) {
            Verdict::NonRetriable(NonRetriable::Ignore)
        } else {
            Verdict::NonRetriable(NonRetriable::Fail)
        };
        tracing::debug!(status = exchange.status(), ?verdict, "classified exchange");
        verdict
    }

    /// Seconds to wait before reissuing a retryable exchange.
    pub fn backoff_seconds(&self, exchange: &Exchange) -> f64 {
        self.backoff.compute(exchange.headers(), self.clock.as_ref())
    }

    /// Delay used when no response is available (transport failures).
    pub fn default_backoff_seconds(&self) -> f64 {
        self.backoff.effective_default()
    }

    fn filter_matches(&self, filter: &Option<ResponseFilter>, exchange: &Exchange) -> bool {
        filter.as_ref().is_some_and(|f| f.matches(exchange))
    }
}
