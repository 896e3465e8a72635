//! Response filters: "does this exchange match a configured condition?"
//!
//! A filter combines up to three conditions with OR: a set of status codes, a
//! substring searched in the body's error field, and a [`Predicate`] evaluated
//! against the parsed body. A filter with nothing configured never matches.
//! Matching never fails; anything that cannot be evaluated counts as "no match".

pub mod predicate;

use crate::exchange::Exchange;
use predicate::{EvalContext, Predicate, SyntaxError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Body field searched by `error_message_contains` when none is configured.
pub const DEFAULT_ERROR_FIELD: &str = "error";

/// Filter configuration as it appears in a stream definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFilterConfig {
    /// Status codes that match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_codes: Option<BTreeSet<u16>>,
    /// Case-sensitive substring searched in the body's error field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message_contains: Option<String>,
    /// Boolean expression evaluated against the parsed body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    /// Body field holding the error message (default `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_field: Option<String>,
}

impl ResponseFilterConfig {
    pub fn with_http_codes(codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            http_codes: Some(codes.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_error_message_contains(needle: impl Into<String>) -> Self {
        Self {
            error_message_contains: Some(needle.into()),
            ..Self::default()
        }
    }

    pub fn with_predicate(predicate: impl Into<String>) -> Self {
        Self {
            predicate: Some(predicate.into()),
            ..Self::default()
        }
    }
}

/// Error raised when a filter's predicate does not parse.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid predicate `{predicate}`: {source}")]
pub struct FilterError {
    pub predicate: String,
    #[source]
    pub source: SyntaxError,
}

#[derive(Debug, Clone)]
enum PredicateSlot {
    Absent,
    Compiled(Predicate),
    /// Predicate text that failed to parse; never matches.
    Invalid,
}

/// Compiled, immutable response filter.
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    http_codes: BTreeSet<u16>,
    error_message_contains: Option<String>,
    error_field: String,
    predicate: PredicateSlot,
}

impl ResponseFilter {
    /// Compiles `config`, rejecting predicates that do not parse.
    pub fn compile(config: &ResponseFilterConfig) -> Result<Self, FilterError> {
        let predicate = match &config.predicate {
            Some(src) => PredicateSlot::Compiled(Predicate::parse(src).map_err(|source| {
                FilterError {
                    predicate: src.clone(),
                    source,
                }
            })?),
            None => PredicateSlot::Absent,
        };
        Ok(Self::build(config, predicate))
    }

    /// Compiles `config`; a predicate that does not parse is logged and then
    /// treated as never matching.
    pub fn from_config(config: &ResponseFilterConfig) -> Self {
        match Self::compile(config) {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!("{}; the predicate will never match", e);
                Self::build(config, PredicateSlot::Invalid)
            }
        }
    }

    fn build(config: &ResponseFilterConfig, predicate: PredicateSlot) -> Self {
        Self {
            http_codes: config.http_codes.clone().unwrap_or_default(),
            error_message_contains: config.error_message_contains.clone(),
            error_field: config
                .error_field
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_FIELD.to_string()),
            predicate,
        }
    }

    /// True when any configured condition matches the exchange.
    pub fn matches(&self, exchange: &Exchange) -> bool {
        self.matches_status(exchange)
            || self.matches_error_message(exchange)
            || self.matches_predicate(exchange)
    }

    fn matches_status(&self, exchange: &Exchange) -> bool {
        self.http_codes.contains(&exchange.status())
    }

    fn matches_error_message(&self, exchange: &Exchange) -> bool {
        let Some(needle) = self.error_message_contains.as_deref() else {
            return false;
        };
        match exchange.json().and_then(|body| body.get(self.error_field.as_str())) {
            Some(Value::String(message)) => message.contains(needle),
            Some(other) => other.to_string().contains(needle),
            None => false,
        }
    }

    fn matches_predicate(&self, exchange: &Exchange) -> bool {
        let PredicateSlot::Compiled(predicate) = &self.predicate else {
            return false;
        };
        let ctx = EvalContext::new(exchange.json(), exchange.headers(), exchange.status());
        match predicate.evaluate(&ctx) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(predicate = predicate.source(), "predicate did not evaluate: {}", e);
                false
            }
        }
    }
}
