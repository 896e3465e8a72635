//! Extract records from a decoded response body.

use crate::stream::{value_at, Record};
use serde_json::Value;

/// Picks records out of a response body at a fixed path of object keys.
///
/// An array at the path yields one record per object element; an object
/// yields itself; anything else (or nothing) yields no records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSelector {
    path: Vec<String>,
}

impl RecordSelector {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    pub fn select(&self, body: Option<&Value>) -> Vec<Record> {
        let Some(found) = body.and_then(|b| value_at(b, self.path.as_slice())) else {
            return Vec::new();
        };
        match found {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map.clone()),
                    other => {
                        tracing::debug!("skipping non-object record: {}", other);
                        None
                    }
                })
                .collect(),
            Value::Object(map) => vec![map.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_at_path() {
        let body = json!({"data": {"items": [{"id": 1}, {"id": 2}, 3]}});
        let sel = RecordSelector::new(vec!["data".into(), "items".into()]);
        let records = sel.select(Some(&body));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], json!(2));
    }

    #[test]
    fn root_array_and_single_object() {
        let sel = RecordSelector::default();
        assert_eq!(sel.select(Some(&json!([{"a": 1}]))).len(), 1);
        assert_eq!(sel.select(Some(&json!({"a": 1}))).len(), 1);
    }

    #[test]
    fn missing_path_or_body_yields_nothing() {
        let sel = RecordSelector::new(vec!["data".into()]);
        assert!(sel.select(Some(&json!({"other": []}))).is_empty());
        assert!(sel.select(None).is_empty());
        assert!(sel.select(Some(&json!({"data": "text"}))).is_empty());
    }
}
