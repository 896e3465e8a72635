//! Errors surfaced by the retry loop and the transport beneath it.

use thiserror::Error;

/// Longest body excerpt carried by [`RequestError::Failed`].
const BODY_EXCERPT_LEN: usize = 512;

/// The request could not be completed at the transport level (no response).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Other(String),
}

/// A request that ended without a usable response.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The engine classified the response as fatal.
    #[error("HTTP {status}: {body}")]
    Failed { status: u16, body: String },
    /// Every allowed attempt was classified as retryable.
    #[error("giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl RequestError {
    /// Fatal-response error with the body cut down to a readable excerpt.
    pub fn failed(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        RequestError::Failed { status, body }
    }
}
