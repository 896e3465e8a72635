//! Assemble engines and streams from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{RetryConfig, StreamConfig};
use crate::filter::{FilterError, ResponseFilter};
use crate::http::CurlRequester;
use crate::retriever::{Paginator, RecordSelector, SimpleRetriever};
use crate::retry::RetryDecisionEngine;
use crate::stream::{ConfigurableStream, InlineSchemaLoader, JsonFileSchemaLoader, SchemaLoader};

/// Retry engine for `stream`, using `clock` for rate-limit reset arithmetic.
pub fn build_engine(stream: &StreamConfig, retry: &RetryConfig, clock: Arc<dyn Clock>) -> RetryDecisionEngine {
    RetryDecisionEngine::from_configs(stream.retry_filter.as_ref(), stream.ignore_filter.as_ref())
        .with_backoff(retry.backoff())
        .with_clock(clock)
}

/// Compile every filter predicate of `stream`, collecting the ones that fail.
pub fn check_filters(stream: &StreamConfig) -> Vec<FilterError> {
    [&stream.retry_filter, &stream.ignore_filter]
        .into_iter()
        .flatten()
        .filter_map(|cfg| ResponseFilter::compile(cfg).err())
        .collect()
}

/// Build a curl-backed stream from its configuration.
pub fn build_stream(
    stream: &StreamConfig,
    retry: &RetryConfig,
    clock: Arc<dyn Clock>,
) -> Result<ConfigurableStream> {
    let mut requester = CurlRequester::new(&stream.url)
        .with_context(|| format!("stream {}: bad url {}", stream.name, stream.url))?
        .with_headers(stream.headers.clone())
        .with_page_token_param(stream.page_token_param.clone());
    if let Some(param) = &stream.cursor_param {
        requester = requester.with_cursor_param(stream.cursor_field.clone(), param.clone());
    }

    let paginator = match &stream.next_page_path {
        Some(path) => Paginator::BodyToken { path: path.clone() },
        None => Paginator::SinglePage,
    };

    let retriever = SimpleRetriever::new(requester, build_engine(stream, retry, clock))
        .with_policy(retry.policy())
        .with_selector(RecordSelector::new(stream.records_path.clone()))
        .with_paginator(paginator)
        .with_cursor_field(stream.cursor_field.clone())
        .with_checkpoint_interval(stream.checkpoint_interval);

    let schema_loader: Box<dyn SchemaLoader> = match &stream.schema_path {
        Some(path) => Box::new(JsonFileSchemaLoader::new(path)),
        None => Box::new(InlineSchemaLoader::default()),
    };

    Ok(ConfigurableStream::new(
        stream.name.clone(),
        stream.primary_key.clone(),
        stream.cursor_field.clone(),
        schema_loader,
        Box::new(retriever),
    ))
}
