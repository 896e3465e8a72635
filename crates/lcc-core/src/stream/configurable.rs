//! Stream assembled from configuration: a retriever plus a schema loader.

use super::{
    CursorField, IncrementalSync, PrimaryKey, RecordIter, Retriever, SchemaError, SchemaLoader,
    SliceIter, Stream, StreamSlice, StreamState, SyncMode,
};
use serde_json::Value;
use std::num::NonZeroU64;

pub struct ConfigurableStream {
    name: String,
    primary_key: Option<PrimaryKey>,
    cursor_field: CursorField,
    schema_loader: Box<dyn SchemaLoader>,
    retriever: Box<dyn Retriever>,
}

impl ConfigurableStream {
    pub fn new(
        name: impl Into<String>,
        primary_key: Option<PrimaryKey>,
        cursor_field: CursorField,
        schema_loader: Box<dyn SchemaLoader>,
        retriever: Box<dyn Retriever>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_key,
            cursor_field,
            schema_loader,
            retriever,
        }
    }
}

impl std::fmt::Debug for ConfigurableStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurableStream")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("cursor_field", &self.cursor_field)
            .finish_non_exhaustive()
    }
}

impl Stream for ConfigurableStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    fn json_schema(&self) -> Result<Value, SchemaError> {
        self.schema_loader.json_schema()
    }

    fn stream_slices(
        &self,
        sync_mode: SyncMode,
        _cursor_field: Option<&CursorField>,
        state: Option<&StreamState>,
    ) -> SliceIter<'_> {
        // The cursor is fixed at construction; the retriever already knows it.
        self.retriever.stream_slices(sync_mode, state)
    }

    fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&CursorField>,
        slice: Option<&StreamSlice>,
        state: Option<&StreamState>,
    ) -> RecordIter<'_> {
        self.retriever
            .read_records(sync_mode, cursor_field, slice, state)
    }
}

impl IncrementalSync for ConfigurableStream {
    fn cursor_field(&self) -> &CursorField {
        &self.cursor_field
    }

    fn state(&self) -> StreamState {
        self.retriever.state()
    }

    /// No-op. The retriever owns the state and advances it only while records
    /// are read; this setter exists so callers written against the generic
    /// stream interface can still call it.
    fn set_state(&mut self, _state: StreamState) {}

    fn state_checkpoint_interval(&self) -> Option<NonZeroU64> {
        self.retriever.state_checkpoint_interval()
    }
}
