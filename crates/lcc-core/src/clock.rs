//! Wall-clock abstraction.
//!
//! Backoff computed from rate-limit reset headers depends on "now"; taking the
//! time through [`Clock`] keeps that arithmetic deterministic in tests.

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time as seconds since the Unix epoch.
///
/// Implementations must be side-effect free; the engine may call `now`
/// any number of times per exchange.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> f64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// A clock frozen at a given epoch timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}
