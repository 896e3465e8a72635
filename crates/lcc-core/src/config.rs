use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use crate::filter::ResponseFilterConfig;
use crate::retry::{BackoffConfig, RetryPolicy, DEFAULT_BACKOFF_SECS, DEFAULT_RATE_LIMIT_RESET_HEADER};
use crate::stream::{CursorField, PrimaryKey};

/// Retry parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Backoff in seconds when a retryable response has no timing headers.
    #[serde(default = "default_backoff_secs")]
    pub default_backoff_secs: f64,
    /// Header holding the epoch second at which a rate limit resets.
    #[serde(default = "default_rate_limit_reset_header")]
    pub rate_limit_reset_header: String,
}

fn default_backoff_secs() -> f64 {
    DEFAULT_BACKOFF_SECS
}

fn default_rate_limit_reset_header() -> String {
    DEFAULT_RATE_LIMIT_RESET_HEADER.to_string()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RetryPolicy::default().max_attempts,
            default_backoff_secs: DEFAULT_BACKOFF_SECS,
            rate_limit_reset_header: DEFAULT_RATE_LIMIT_RESET_HEADER.to_string(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
        }
    }

    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            default_backoff_secs: self.default_backoff_secs,
            rate_limit_reset_header: self.rate_limit_reset_header.clone(),
        }
    }
}

/// One stream definition (`[[streams]]` in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub name: String,
    /// Base URL of the first page.
    pub url: String,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    pub cursor_field: CursorField,
    /// Object keys leading to the records in each response body (empty = body itself).
    #[serde(default)]
    pub records_path: Vec<String>,
    /// Object keys leading to the next-page token; absent = single page.
    #[serde(default)]
    pub next_page_path: Option<Vec<String>>,
    /// Query parameter carrying the next-page token.
    #[serde(default = "default_page_token_param")]
    pub page_token_param: String,
    /// Query parameter carrying the saved cursor value on incremental reads.
    #[serde(default)]
    pub cursor_param: Option<String>,
    /// Persist state every N records; absent = only after the stream is exhausted.
    #[serde(default)]
    pub checkpoint_interval: Option<NonZeroU64>,
    /// JSON schema file; absent = open object schema.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub retry_filter: Option<ResponseFilterConfig>,
    #[serde(default)]
    pub ignore_filter: Option<ResponseFilterConfig>,
}

fn default_page_token_param() -> String {
    "page".to_string()
}

/// Global configuration loaded from `~/.config/lcc/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LccConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

impl LccConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn stream(&self, name: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.name == name)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lcc")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LccConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LccConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<LccConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LccConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
