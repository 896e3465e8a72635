//! Next-page token extraction.

use crate::stream::value_at;
use serde_json::Value;

/// How the next page is found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Paginator {
    /// One request per slice.
    #[default]
    SinglePage,
    /// The token for the next request is read from the response body; a
    /// missing, null or empty value ends pagination.
    BodyToken { path: Vec<String> },
}

impl Paginator {
    pub fn next_token(&self, body: Option<&Value>) -> Option<String> {
        let Paginator::BodyToken { path } = self else {
            return None;
        };
        match body.and_then(|b| value_at(b, path.as_slice()))? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
