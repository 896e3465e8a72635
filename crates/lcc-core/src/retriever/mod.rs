//! A simple retriever: request pages, gate them through the retry engine,
//! extract records and track the cursor.
//!
//! Requests go out through a [`Requester`], so the transport (curl in
//! production, scripted responses in tests) is swappable. State lives in a
//! `RefCell` so it can be read between records while a record iterator is
//! alive.

mod cursor;
mod pagination;
mod records;

pub use pagination::Paginator;
pub use records::RecordSelector;

use crate::exchange::Exchange;
use crate::retry::{
    send_with_retry, RetryDecisionEngine, RetryPolicy, Sleeper, ThreadSleeper, TransportError,
};
use crate::stream::{
    CursorField, Record, RecordIter, Retriever, SliceIter, StreamError, StreamSlice, StreamState,
    SyncMode,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::num::NonZeroU64;

/// Everything the transport needs to issue one page request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub slice: Option<StreamSlice>,
    /// Token returned by the previous page; `None` for the first page.
    pub page_token: Option<String>,
    /// State as it was when reading started (empty for full refresh).
    pub stream_state: StreamState,
}

/// Issues one HTTP request for a page.
pub trait Requester {
    fn send(&self, request: &PageRequest) -> Result<Exchange, TransportError>;
}

pub struct SimpleRetriever<Q> {
    requester: Q,
    engine: RetryDecisionEngine,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    selector: RecordSelector,
    paginator: Paginator,
    cursor_field: Option<CursorField>,
    checkpoint_interval: Option<NonZeroU64>,
    state: RefCell<StreamState>,
}

impl<Q: Requester> SimpleRetriever<Q> {
    pub fn new(requester: Q, engine: RetryDecisionEngine) -> Self {
        Self {
            requester,
            engine,
            policy: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            selector: RecordSelector::default(),
            paginator: Paginator::default(),
            cursor_field: None,
            checkpoint_interval: None,
            state: RefCell::new(StreamState::new()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_selector(mut self, selector: RecordSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn with_cursor_field(mut self, cursor_field: CursorField) -> Self {
        self.cursor_field = Some(cursor_field);
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: Option<NonZeroU64>) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Moves the cursor forward if `record` carries a newer value.
    fn observe(&self, cursor_field: &CursorField, record: &Record) {
        let Some(value) = cursor_field.value_in(record) else {
            return;
        };
        let key = cursor_field.state_key();
        let mut state = self.state.borrow_mut();
        if cursor::advances(value, state.get(&key)) {
            state.insert(key, value.clone());
        }
    }
}

impl<Q: Requester> Retriever for SimpleRetriever<Q> {
    fn state(&self) -> StreamState {
        self.state.borrow().clone()
    }

    /// On incremental reads, incoming `state` (from a previous run) seeds the
    /// retriever's state and is handed to the requester unchanged for every
    /// page of this read. Full refresh ignores it.
    fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&CursorField>,
        slice: Option<&StreamSlice>,
        state: Option<&StreamState>,
    ) -> RecordIter<'_> {
        let (cursor_field, stream_state) = match sync_mode {
            SyncMode::Incremental => {
                if let Some(incoming) = state {
                    *self.state.borrow_mut() = incoming.clone();
                }
                (
                    cursor_field.cloned().or_else(|| self.cursor_field.clone()),
                    self.state(),
                )
            }
            SyncMode::FullRefresh => (None, StreamState::new()),
        };
        Box::new(Pages {
            retriever: self,
            cursor_field,
            request: PageRequest {
                slice: slice.cloned(),
                page_token: None,
                stream_state,
            },
            buffered: VecDeque::new(),
            done: false,
        })
    }

    fn stream_slices(&self, _sync_mode: SyncMode, _state: Option<&StreamState>) -> SliceIter<'_> {
        Box::new(std::iter::once(None))
    }

    fn state_checkpoint_interval(&self) -> Option<NonZeroU64> {
        self.checkpoint_interval
    }
}

/// Lazy page walker behind [`SimpleRetriever::read_records`].
struct Pages<'a, Q> {
    retriever: &'a SimpleRetriever<Q>,
    cursor_field: Option<CursorField>,
    request: PageRequest,
    buffered: VecDeque<Record>,
    done: bool,
}

impl<Q: Requester> Pages<'_, Q> {
    /// Fetches the next page into the buffer. Returns an error only for
    /// fatal verdicts or an exhausted retry budget.
    fn fetch(&mut self) -> Result<(), StreamError> {
        let r = self.retriever;
        let outcome = send_with_retry(&r.engine, &r.policy, r.sleeper.as_ref(), || {
            r.requester.send(&self.request)
        });
        let exchange = match outcome {
            Ok(Some(exchange)) => exchange,
            Ok(None) => {
                // Ignored page: its data is dropped and there is no token to follow.
                self.done = true;
                return Ok(());
            }
            Err(e) => {
                self.done = true;
                return Err(e.into());
            }
        };

        self.buffered.extend(r.selector.select(exchange.json()));
        match r.paginator.next_token(exchange.json()) {
            Some(token) if self.request.page_token.as_ref() == Some(&token) => {
                tracing::warn!(token = %token, "next-page token repeated; stopping pagination");
                self.done = true;
            }
            Some(token) => self.request.page_token = Some(token),
            None => self.done = true,
        }
        Ok(())
    }
}

impl<Q: Requester> Iterator for Pages<'_, Q> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffered.pop_front() {
                if let Some(cursor_field) = &self.cursor_field {
                    self.retriever.observe(cursor_field, &record);
                }
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch() {
                return Some(Err(e));
            }
        }
    }
}
