use super::{CursorField, RecordIter, SliceIter, StreamSlice, StreamState, SyncMode};
use std::num::NonZeroU64;

/// Fetches records (paginating as needed) and owns the sync state.
pub trait Retriever {
    /// Snapshot of the current state.
    fn state(&self) -> StreamState;

    fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&CursorField>,
        slice: Option<&StreamSlice>,
        state: Option<&StreamState>,
    ) -> RecordIter<'_>;

    fn stream_slices(&self, sync_mode: SyncMode, state: Option<&StreamState>) -> SliceIter<'_>;

    fn state_checkpoint_interval(&self) -> Option<NonZeroU64>;
}
