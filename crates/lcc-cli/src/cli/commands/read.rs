//! `lcc read` – run a configured stream and emit records and state as JSON lines.

use anyhow::{anyhow, bail, Context, Result};
use lcc_core::clock::SystemClock;
use lcc_core::config::LccConfig;
use lcc_core::factory::build_stream;
use lcc_core::stream::{IncrementalSync, Stream, StreamState, SyncMode};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

pub fn run_read(
    cfg: &LccConfig,
    name: &str,
    full_refresh: bool,
    state_path: Option<&Path>,
) -> Result<()> {
    let stream_cfg = cfg
        .stream(name)
        .ok_or_else(|| anyhow!("unknown stream: {}", name))?;
    let stream = build_stream(stream_cfg, &cfg.retry_or_default(), Arc::new(SystemClock))?;
    // Fail before any request if the schema cannot be loaded.
    stream
        .json_schema()
        .with_context(|| format!("stream {}: load schema", name))?;

    let sync_mode = if full_refresh {
        SyncMode::FullRefresh
    } else {
        SyncMode::Incremental
    };
    let state = match state_path {
        Some(path) if !full_refresh => Some(load_state(path)?),
        _ => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = emit(&stream, sync_mode, state.as_ref(), &mut out)?;
    tracing::info!(stream = name, records = count, "read complete");
    Ok(())
}

fn load_state(path: &Path) -> Result<StreamState> {
    let data = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    match serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => bail!("{}: state must be a JSON object", path.display()),
    }
}

/// Write every record of `stream` to `out`, with a state line every
/// checkpoint interval and one after the last record. Returns the record count.
pub(crate) fn emit<S, W>(
    stream: &S,
    sync_mode: SyncMode,
    state: Option<&StreamState>,
    out: &mut W,
) -> Result<u64>
where
    S: Stream + IncrementalSync,
    W: Write,
{
    let cursor_field = match sync_mode {
        SyncMode::Incremental => Some(stream.cursor_field()),
        SyncMode::FullRefresh => None,
    };
    let interval = stream.state_checkpoint_interval().map(|n| n.get());
    let mut count = 0u64;

    for slice in stream.stream_slices(sync_mode, cursor_field, state) {
        for record in stream.read_records(sync_mode, cursor_field, slice.as_ref(), state) {
            let record = record.with_context(|| format!("stream {}", stream.name()))?;
            writeln!(out, "{}", Value::Object(record))?;
            count += 1;
            if interval.is_some_and(|n| count % n == 0) {
                write_state(stream, out)?;
            }
        }
    }
    write_state(stream, out)?;
    Ok(count)
}

fn write_state<S: Stream + IncrementalSync, W: Write>(stream: &S, out: &mut W) -> Result<()> {
    let line = json!({
        "type": "STATE",
        "stream": stream.name(),
        "data": Value::Object(stream.state()),
    });
    writeln!(out, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcc_core::retry::RequestError;
    use lcc_core::stream::{
        ConfigurableStream, CursorField, InlineSchemaLoader, Record, RecordIter, Retriever,
        SliceIter, StreamError, StreamSlice,
    };
    use std::cell::RefCell;
    use std::num::NonZeroU64;

    /// Serves fixed records, advancing `ts` in state as they are read.
    struct ListRetriever {
        records: Vec<Record>,
        fail_at: Option<usize>,
        interval: Option<NonZeroU64>,
        state: RefCell<StreamState>,
    }

    impl ListRetriever {
        fn new(n: i64) -> Self {
            let records = (1..=n)
                .map(|ts| json!({"id": ts, "ts": ts}).as_object().cloned().unwrap())
                .collect();
            Self {
                records,
                fail_at: None,
                interval: None,
                state: RefCell::new(StreamState::new()),
            }
        }
    }

    impl Retriever for ListRetriever {
        fn state(&self) -> StreamState {
            self.state.borrow().clone()
        }

        fn read_records(
            &self,
            sync_mode: SyncMode,
            _cursor_field: Option<&CursorField>,
            _slice: Option<&StreamSlice>,
            _state: Option<&StreamState>,
        ) -> RecordIter<'_> {
            Box::new(self.records.iter().enumerate().map(move |(i, r)| {
                if Some(i) == self.fail_at {
                    return Err(StreamError::Request(RequestError::failed(500, "boom")));
                }
                if sync_mode == SyncMode::Incremental {
                    self.state.borrow_mut().insert("ts".into(), r["ts"].clone());
                }
                Ok(r.clone())
            }))
        }

        fn stream_slices(&self, _sync_mode: SyncMode, _state: Option<&StreamState>) -> SliceIter<'_> {
            Box::new(std::iter::once(None))
        }

        fn state_checkpoint_interval(&self) -> Option<NonZeroU64> {
            self.interval
        }
    }

    fn stream(retriever: ListRetriever) -> ConfigurableStream {
        ConfigurableStream::new(
            "events",
            None,
            CursorField::Field("ts".into()),
            Box::new(InlineSchemaLoader::default()),
            Box::new(retriever),
        )
    }

    fn lines(buf: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn state_emitted_every_interval_and_at_end() {
        let mut r = ListRetriever::new(5);
        r.interval = NonZeroU64::new(2);
        let mut out = Vec::new();
        let n = emit(&stream(r), SyncMode::Incremental, None, &mut out).unwrap();
        assert_eq!(n, 5);

        let lines = lines(&out);
        let states: Vec<&Value> = lines.iter().filter(|l| l["type"] == "STATE").collect();
        assert_eq!(states.len(), 3);
        assert_eq!(states[0]["data"]["ts"], 2);
        assert_eq!(states[1]["data"]["ts"], 4);
        assert_eq!(states[2]["data"]["ts"], 5);
        assert_eq!(states[2]["stream"], "events");
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[2]["type"], "STATE");
    }

    #[test]
    fn without_interval_state_only_at_end() {
        let mut out = Vec::new();
        emit(&stream(ListRetriever::new(3)), SyncMode::Incremental, None, &mut out).unwrap();
        let lines = lines(&out);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3]["type"], "STATE");
        assert_eq!(lines[3]["data"]["ts"], 3);
    }

    #[test]
    fn full_refresh_emits_empty_state() {
        let mut out = Vec::new();
        emit(&stream(ListRetriever::new(2)), SyncMode::FullRefresh, None, &mut out).unwrap();
        let lines = lines(&out);
        assert_eq!(lines.last().unwrap()["data"], json!({}));
    }

    #[test]
    fn failing_record_stops_read_without_final_state() {
        let mut r = ListRetriever::new(3);
        r.fail_at = Some(1);
        let mut out = Vec::new();
        let err = emit(&stream(r), SyncMode::Incremental, None, &mut out).unwrap_err();
        assert!(format!("{:#}", err).contains("events"));
        let lines = lines(&out);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], 1);
    }

    #[test]
    fn state_file_must_hold_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"ts": 10}"#).unwrap();
        assert_eq!(load_state(&good).unwrap()["ts"], 10);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2]").unwrap();
        assert!(load_state(&bad).is_err());
    }
}
