//! Cursor comparison for state bookkeeping.

use serde_json::Value;
use std::cmp::Ordering;

/// True when `candidate` should replace `current` as the stream's cursor.
///
/// Numbers compare numerically and strings lexicographically (ISO-8601
/// timestamps order correctly this way). Values of different kinds never
/// replace an existing cursor.
pub(crate) fn advances(candidate: &Value, current: Option<&Value>) -> bool {
    let Some(current) = current else {
        return !candidate.is_null();
    };
    let ordering = match (candidate, current) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering == Some(Ordering::Greater)
}
