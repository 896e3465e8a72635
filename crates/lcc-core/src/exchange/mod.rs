//! Completed HTTP exchanges as seen by the retry engine.
//!
//! An [`Exchange`] is the status code, headers and body of one finished
//! request. The body is kept both raw and as a best-effort JSON parse so
//! filters and predicates never have to re-parse it.

mod parse;

use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) use parse::parse_header_lines;

/// Response headers with case-insensitive lookup.
///
/// Names are stored lower-cased; when a header repeats, the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.inner
            .insert(name.as_ref().trim().to_ascii_lowercase(), value.into());
    }

    /// Looks up a header by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates `(lower-cased name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// One completed HTTP request/response pair.
#[derive(Debug, Clone)]
pub struct Exchange {
    status: u16,
    headers: Headers,
    body: String,
    json: Option<Value>,
}

impl Exchange {
    /// Builds an exchange from its raw parts, parsing the body as JSON when possible.
    pub fn new(status: u16, headers: Headers, body: impl Into<String>) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            headers,
            body,
            json,
        }
    }

    /// Builds an exchange whose body is an already-decoded JSON value.
    pub fn with_json(status: u16, headers: Headers, json: Value) -> Self {
        Self {
            status,
            headers,
            body: json.to_string(),
            json: Some(json),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Raw response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parsed body, or `None` when the body is not valid JSON.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// True for informational, success and redirect statuses (below 400).
    pub fn ok(&self) -> bool {
        self.status < 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_ignores_case() {
        let headers: Headers = [("Retry-After", "120")].into_iter().collect();
        assert_eq!(headers.get("retry-after"), Some("120"));
        assert_eq!(headers.get("RETRY-AFTER"), Some("120"));
        assert_eq!(headers.get("x-ratelimit-reset"), None);
    }

    #[test]
    fn repeated_header_keeps_last_value() {
        let mut headers = Headers::new();
        headers.insert("X-Test", "a");
        headers.insert("x-test", "b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-TEST"), Some("b"));
    }

    #[test]
    fn body_is_parsed_best_effort() {
        let ex = Exchange::new(200, Headers::new(), r#"{"data": [1, 2]}"#);
        assert_eq!(ex.json(), Some(&json!({"data": [1, 2]})));

        let ex = Exchange::new(502, Headers::new(), "<html>Bad Gateway</html>");
        assert!(ex.json().is_none());
        assert_eq!(ex.body(), "<html>Bad Gateway</html>");
    }

    #[test]
    fn ok_flag_follows_status_range() {
        assert!(Exchange::new(200, Headers::new(), "").ok());
        assert!(Exchange::new(308, Headers::new(), "").ok());
        assert!(!Exchange::new(403, Headers::new(), "").ok());
        assert!(!Exchange::new(500, Headers::new(), "").ok());
    }
}
