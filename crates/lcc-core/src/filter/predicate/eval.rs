//! Evaluation of predicate trees over JSON values.

use super::{CompareOp, Expr, PredicateError, Segment};
use crate::exchange::Headers;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Names bound while evaluating a predicate against one exchange.
///
/// `decoded_response` and `response` are the parsed body, `headers` is a map
/// of lower-cased header names and `status_code` the numeric status. Any
/// other root name is looked up as a top-level field of the body.
#[derive(Debug)]
pub struct EvalContext<'a> {
    body: Option<&'a Value>,
    headers: Value,
    status: Value,
}

impl<'a> EvalContext<'a> {
    pub fn new(body: Option<&'a Value>, headers: &Headers, status: u16) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect::<Map<_, _>>();
        Self {
            body,
            headers: Value::Object(headers),
            status: Value::from(status),
        }
    }

    fn root(&self, name: &str) -> Result<&Value, PredicateError> {
        match name {
            "decoded_response" | "response" => self.body.ok_or(PredicateError::NoBody),
            "headers" => Ok(&self.headers),
            "status_code" => Ok(&self.status),
            field => self
                .body
                .ok_or(PredicateError::NoBody)?
                .get(field)
                .ok_or_else(|| PredicateError::MissingField(field.to_string())),
        }
    }
}

pub(super) fn evaluate<'a>(
    expr: &'a Expr,
    ctx: &'a EvalContext<'_>,
) -> Result<Cow<'a, Value>, PredicateError> {
    match expr {
        Expr::Literal(v) => Ok(Cow::Borrowed(v)),
        Expr::Path { root, segments } => resolve(ctx, root, segments).map(Cow::Borrowed),
        Expr::Not(inner) => Ok(Cow::Owned(Value::Bool(!truthy(evaluate(inner, ctx)?.as_ref())))),
        Expr::And(lhs, rhs) => {
            let result = truthy(evaluate(lhs, ctx)?.as_ref()) && truthy(evaluate(rhs, ctx)?.as_ref());
            Ok(Cow::Owned(Value::Bool(result)))
        }
        Expr::Or(lhs, rhs) => {
            let result = truthy(evaluate(lhs, ctx)?.as_ref()) || truthy(evaluate(rhs, ctx)?.as_ref());
            Ok(Cow::Owned(Value::Bool(result)))
        }
        Expr::Compare { lhs, op, rhs } => {
            let l = evaluate(lhs, ctx)?;
            let r = evaluate(rhs, ctx)?;
            compare(&l, *op, &r).map(|b| Cow::Owned(Value::Bool(b)))
        }
    }
}

fn resolve<'a>(
    ctx: &'a EvalContext<'_>,
    root: &str,
    segments: &[Segment],
) -> Result<&'a Value, PredicateError> {
    let mut current = ctx.root(root)?;
    for (i, segment) in segments.iter().enumerate() {
        let next = match segment {
            Segment::Key(key) => current.get(key.as_str()),
            Segment::Index(idx) => current.get(*idx),
        };
        current = next.ok_or_else(|| PredicateError::MissingField(render_path(root, &segments[..=i])))?;
    }
    Ok(current)
}

fn render_path(root: &str, segments: &[Segment]) -> String {
    let mut out = root.to_string();
    for segment in segments {
        match segment {
            Segment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Index(idx) => out.push_str(&format!("[{}]", idx)),
        }
    }
    out
}

/// Truthiness: null, false, zero, empty strings and empty containers are false.
pub(super) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, op: CompareOp, rhs: &Value) -> Result<bool, PredicateError> {
    let mismatch = || PredicateError::TypeMismatch {
        op: op.symbol(),
        lhs: kind(lhs),
        rhs: kind(rhs),
    };

    match op {
        CompareOp::Eq => Ok(loose_eq(lhs, rhs)),
        CompareOp::Ne => Ok(!loose_eq(lhs, rhs)),
        CompareOp::In | CompareOp::NotIn => {
            let found = match (lhs, rhs) {
                (Value::String(key), Value::Object(map)) => map.contains_key(key),
                (needle, Value::Array(items)) => items.iter().any(|item| loose_eq(needle, item)),
                (Value::String(needle), Value::String(haystack)) => {
                    haystack.contains(needle.as_str())
                }
                _ => return Err(mismatch()),
            };
            Ok(found == (op == CompareOp::In))
        }
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a
                    .as_f64()
                    .zip(b.as_f64())
                    .and_then(|(a, b)| a.partial_cmp(&b)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            }
            .ok_or_else(mismatch)?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Predicate;
    use super::*;
    use serde_json::json;

    fn check(src: &str, body: &Value, headers: &Headers) -> Result<bool, PredicateError> {
        let ctx = EvalContext::new(Some(body), headers, 429);
        Predicate::parse(src).unwrap().evaluate(&ctx)
    }

    #[test]
    fn numeric_comparisons_ignore_representation() {
        let body = json!({"remaining": 0, "limit": 100.0});
        let h = Headers::new();
        assert_eq!(check("remaining == 0.0", &body, &h), Ok(true));
        assert_eq!(check("limit >= 100", &body, &h), Ok(true));
        assert_eq!(check("remaining < limit", &body, &h), Ok(true));
        assert_eq!(check("status_code == 429", &body, &h), Ok(true));
    }

    #[test]
    fn string_and_array_membership() {
        let body = json!({"message": "quota exceeded", "tags": ["a", 2]});
        let h = Headers::new();
        assert_eq!(check("'quota' in message", &body, &h), Ok(true));
        assert_eq!(check("2 in tags", &body, &h), Ok(true));
        assert_eq!(check("'b' in tags", &body, &h), Ok(false));
    }

    #[test]
    fn headers_are_lowercased() {
        let body = json!({});
        let h: Headers = [("X-Error-Kind", "throttle")].into_iter().collect();
        assert_eq!(
            check("headers['x-error-kind'] == 'throttle'", &body, &h),
            Ok(true)
        );
    }

    #[test]
    fn mismatched_types_error_instead_of_guessing() {
        let body = json!({"count": 3});
        let h = Headers::new();
        assert_eq!(
            check("count > 'a'", &body, &h),
            Err(PredicateError::TypeMismatch {
                op: ">",
                lhs: "number",
                rhs: "string"
            })
        );
        assert!(check("1 in count", &body, &h).is_err());
    }

    #[test]
    fn missing_body_only_fails_body_lookups() {
        let h = Headers::new();
        let ctx = EvalContext::new(None, &h, 500);
        let p = Predicate::parse("'code' in decoded_response").unwrap();
        assert_eq!(p.evaluate(&ctx), Err(PredicateError::NoBody));
        let p = Predicate::parse("status_code >= 500").unwrap();
        assert_eq!(p.evaluate(&ctx), Ok(true));
    }

    #[test]
    fn missing_index_reports_full_path() {
        let body = json!({"errors": []});
        let h = Headers::new();
        assert_eq!(
            check("errors[0].code == 1", &body, &h),
            Err(PredicateError::MissingField("errors[0]".into()))
        );
    }

    #[test]
    fn boolean_operators_short_circuit() {
        let body = json!({"code": 1000, "retry": false, "tags": []});
        let h = Headers::new();
        assert_eq!(check("not retry", &body, &h), Ok(true));
        assert_eq!(check("not tags and code == 1000", &body, &h), Ok(true));
        assert_eq!(check("retry or code", &body, &h), Ok(true));
        assert_eq!(check("retry and missing == 1", &body, &h), Ok(false));
        assert_eq!(check("code or missing == 1", &body, &h), Ok(true));
        assert_eq!(
            check("code and missing == 1", &body, &h),
            Err(PredicateError::MissingField("missing".into()))
        );
    }

    #[test]
    fn truthiness_of_bare_values() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!({})));
        assert!(truthy(&json!([0])));
        assert!(truthy(&json!("x")));
    }
}
