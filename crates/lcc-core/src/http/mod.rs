//! HTTP transport for the simple retriever.
//!
//! Uses the curl crate (libcurl) to issue GET requests and capture the final
//! response's status, headers and body as an [`Exchange`]. Classification is
//! left entirely to the retry engine: any completed transfer, whatever its
//! status, is returned as `Ok`.

use crate::exchange::{parse_header_lines, Exchange};
use crate::retriever::{PageRequest, Requester};
use crate::retry::TransportError;
use crate::stream::{CursorField, StreamState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str;
use std::time::Duration;
use url::Url;

/// Issues one GET per page with libcurl.
#[derive(Debug, Clone)]
pub struct CurlRequester {
    url: Url,
    headers: BTreeMap<String, String>,
    page_token_param: String,
    cursor: Option<(CursorField, String)>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlRequester {
    pub fn new(url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            url: Url::parse(url)?,
            headers: BTreeMap::new(),
            page_token_param: "page".to_string(),
            cursor: None,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        })
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Query parameter carrying the next-page token.
    pub fn with_page_token_param(mut self, param: impl Into<String>) -> Self {
        self.page_token_param = param.into();
        self
    }

    /// Send the state's cursor value (if any) as query parameter `param`.
    pub fn with_cursor_param(mut self, cursor_field: CursorField, param: impl Into<String>) -> Self {
        self.cursor = Some((cursor_field, param.into()));
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.timeout = total;
        self
    }

    /// Full URL for `request`: base URL plus cursor and page-token parameters.
    pub fn request_url(&self, request: &PageRequest) -> Url {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(value) = self.cursor_value(&request.stream_state) {
                if let Some((_, param)) = &self.cursor {
                    query.append_pair(param, &value);
                }
            }
            if let Some(token) = &request.page_token {
                query.append_pair(&self.page_token_param, token);
            }
        }
        // `query_pairs_mut` leaves a dangling `?` when nothing was appended.
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }

    fn cursor_value(&self, state: &StreamState) -> Option<String> {
        let (cursor_field, _) = self.cursor.as_ref()?;
        match state.get(&cursor_field.state_key())? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Requester for CurlRequester {
    /// Runs in the current thread; the transfer blocks until complete.
    fn send(&self, request: &PageRequest) -> Result<Exchange, TransportError> {
        let url = self.request_url(request);
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        // Build curl list for custom headers (e.g. "Name: value").
        if !self.headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in &self.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        let status = u16::try_from(code)
            .map_err(|_| TransportError::Other(format!("invalid HTTP status {}", code)))?;
        tracing::debug!(url = %url, status, bytes = body.len(), "page fetched");

        Ok(Exchange::new(
            status,
            parse_header_lines(&header_lines),
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }
}
