//! Stream contract consumed by a sync engine.
//!
//! A stream's surface is split into two capabilities: [`Stream`] (identity,
//! schema, slices, records) and [`IncrementalSync`] (cursor, state and
//! checkpoint cadence). [`ConfigurableStream`] implements both by delegating
//! to a [`Retriever`] and a [`SchemaLoader`].

mod configurable;
mod retriever;
mod schema;

pub use configurable::ConfigurableStream;
pub use retriever::Retriever;
pub use schema::{InlineSchemaLoader, JsonFileSchemaLoader, SchemaError, SchemaLoader};

use crate::retry::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::NonZeroU64;
use thiserror::Error;

/// One record read from a stream.
pub type Record = Map<String, Value>;

/// Opaque slice descriptor; `None` in a slice sequence means "the whole stream".
pub type StreamSlice = Map<String, Value>;

/// Sync state owned by the retriever, persisted externally between runs.
pub type StreamState = Map<String, Value>;

/// Lazily produced records; an `Err` ends the sequence.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Record, StreamError>> + 'a>;

/// Lazily produced slice descriptors.
pub type SliceIter<'a> = Box<dyn Iterator<Item = Option<StreamSlice>> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    FullRefresh,
    Incremental,
}

/// Primary key: a field, a composite of fields, or a composite of nested paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
    Nested(Vec<Vec<String>>),
}

/// Field (or nested path) ordering records for incremental sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorField {
    Field(String),
    Path(Vec<String>),
}

impl CursorField {
    pub fn path(&self) -> Vec<&str> {
        match self {
            CursorField::Field(f) => vec![f.as_str()],
            CursorField::Path(p) => p.iter().map(String::as_str).collect(),
        }
    }

    /// Key under which the cursor value is kept in [`StreamState`].
    pub fn state_key(&self) -> String {
        self.path().join(".")
    }

    /// The cursor value of `record`, if present.
    pub fn value_in<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        let path = self.path();
        let (first, rest) = path.split_first()?;
        value_at(record.get(*first)?, rest)
    }
}

/// Follows `path` (object keys) from `root`.
pub(crate) fn value_at<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |current, key| current.get(key.as_ref()))
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Identity, schema, slicing and record production.
pub trait Stream {
    fn name(&self) -> &str;

    fn primary_key(&self) -> Option<&PrimaryKey>;

    /// JSON schema of the records; loader failures are fatal to the caller.
    fn json_schema(&self) -> Result<Value, SchemaError>;

    /// Slices to read. Not cached: every call recomputes them from `state`.
    fn stream_slices(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&CursorField>,
        state: Option<&StreamState>,
    ) -> SliceIter<'_>;

    /// Records of one slice. Each underlying request goes through the retry
    /// engine; a fatal verdict ends the sequence with an error.
    fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&CursorField>,
        slice: Option<&StreamSlice>,
        state: Option<&StreamState>,
    ) -> RecordIter<'_>;
}

/// Cursor, state and checkpoint cadence for incremental syncs.
pub trait IncrementalSync {
    fn cursor_field(&self) -> &CursorField;

    /// Snapshot of the current sync state.
    fn state(&self) -> StreamState;

    /// Required by the sync engine's interface; state is only advanced by
    /// reading records, so implementations may ignore the value.
    fn set_state(&mut self, state: StreamState);

    /// Persist state every N records, or `None` to persist only once the
    /// stream is exhausted (records not guaranteed to arrive in cursor order).
    fn state_checkpoint_interval(&self) -> Option<NonZeroU64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_key_shapes_from_toml() {
        #[derive(Deserialize)]
        struct W {
            pk: PrimaryKey,
        }
        let w: W = toml::from_str(r#"pk = "id""#).unwrap();
        assert_eq!(w.pk, PrimaryKey::Single("id".into()));
        let w: W = toml::from_str(r#"pk = ["org", "id"]"#).unwrap();
        assert_eq!(w.pk, PrimaryKey::Composite(vec!["org".into(), "id".into()]));
        let w: W = toml::from_str(r#"pk = [["owner", "id"], ["id"]]"#).unwrap();
        assert_eq!(
            w.pk,
            PrimaryKey::Nested(vec![vec!["owner".into(), "id".into()], vec!["id".into()]])
        );
    }

    #[test]
    fn nested_cursor_lookup() {
        let record = json!({"meta": {"updated_at": "2024-01-02"}, "id": 1});
        let record = record.as_object().unwrap();
        let cursor = CursorField::Path(vec!["meta".into(), "updated_at".into()]);
        assert_eq!(cursor.value_in(record), Some(&json!("2024-01-02")));
        assert_eq!(cursor.state_key(), "meta.updated_at");
        assert_eq!(CursorField::Field("missing".into()).value_in(record), None);
    }

    #[test]
    fn sync_mode_names() {
        assert_eq!(
            serde_json::to_string(&SyncMode::FullRefresh).unwrap(),
            "\"full_refresh\""
        );
        assert_eq!(
            serde_json::from_str::<SyncMode>("\"incremental\"").unwrap(),
            SyncMode::Incremental
        );
    }
}
