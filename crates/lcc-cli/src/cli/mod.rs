//! CLI for LCC connector streams.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lcc_core::config::{self, LccConfig};
use std::path::PathBuf;

use commands::{run_check, run_classify, run_read, ClassifyArgs};

/// Top-level CLI for LCC.
#[derive(Debug, Parser)]
#[command(name = "lcc")]
#[command(about = "LCC: response classification and incremental streams", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/lcc/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Classify one HTTP response and print the verdict.
    Classify {
        /// Response status code.
        #[arg(long)]
        status: u16,
        /// Response header as "Name: value" (repeatable).
        #[arg(long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,
        /// File holding the response body, or "-" for stdin.
        #[arg(long, value_name = "FILE")]
        body: Option<String>,
        /// Use the retry/ignore filters of this configured stream.
        #[arg(long, value_name = "NAME")]
        stream: Option<String>,
        /// Current time as epoch seconds (default: system clock).
        #[arg(long, value_name = "EPOCH")]
        now: Option<f64>,
    },

    /// Load the config and compile every filter predicate.
    Check,

    /// Read a configured stream, printing records and state as JSON lines.
    Read {
        /// Stream name from config.
        stream: String,
        /// Read everything and ignore saved state.
        #[arg(long)]
        full_refresh: bool,
        /// JSON file holding state saved by a previous run.
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<LccConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_ref())?;

        match cli.command {
            CliCommand::Classify {
                status,
                headers,
                body,
                stream,
                now,
            } => {
                let args = ClassifyArgs {
                    status,
                    headers,
                    body,
                    stream,
                    now,
                };
                run_classify(&cfg, &args)?;
            }
            CliCommand::Check => run_check(&cfg)?,
            CliCommand::Read {
                stream,
                full_refresh,
                state,
            } => run_read(&cfg, &stream, full_refresh, state.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
