//! `lcc classify` – run the retry engine on one response.

use anyhow::{anyhow, bail, Context, Result};
use lcc_core::clock::{Clock, FixedClock, SystemClock};
use lcc_core::config::LccConfig;
use lcc_core::exchange::{Exchange, Headers};
use lcc_core::factory::build_engine;
use lcc_core::retry::{NonRetriable, RetryDecisionEngine, Verdict};
use std::io::Read;
use std::sync::Arc;

/// Arguments of `lcc classify`, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct ClassifyArgs {
    pub status: u16,
    pub headers: Vec<String>,
    pub body: Option<String>,
    pub stream: Option<String>,
    pub now: Option<f64>,
}

pub fn run_classify(cfg: &LccConfig, args: &ClassifyArgs) -> Result<()> {
    let body = match args.body.as_deref() {
        None => String::new(),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read body from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("read {}", path))?,
    };
    let exchange = Exchange::new(args.status, parse_headers(&args.headers)?, body);
    let engine = engine_for(cfg, args)?;
    println!("{}", describe(&engine.classify(&exchange)));
    Ok(())
}

fn engine_for(cfg: &LccConfig, args: &ClassifyArgs) -> Result<RetryDecisionEngine> {
    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let retry = cfg.retry_or_default();
    match args.stream.as_deref() {
        Some(name) => {
            let stream = cfg
                .stream(name)
                .ok_or_else(|| anyhow!("unknown stream: {}", name))?;
            Ok(build_engine(stream, &retry, clock))
        }
        None => Ok(RetryDecisionEngine::new(None, None)
            .with_backoff(retry.backoff())
            .with_clock(clock)),
    }
}

/// Parse "Name: value" arguments into headers.
pub(crate) fn parse_headers(raw: &[String]) -> Result<Headers> {
    let mut headers = Headers::new();
    for line in raw {
        let Some((name, value)) = line.split_once(':') else {
            bail!("header must look like \"Name: value\": {}", line);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("empty header name: {}", line);
        }
        headers.insert(name, value.trim());
    }
    Ok(headers)
}

pub(crate) fn describe(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Retry(secs) => format!("retry after {}s", secs),
        Verdict::NonRetriable(NonRetriable::Ok) => "ok".to_string(),
        Verdict::NonRetriable(NonRetriable::Ignore) => "ignore".to_string(),
        Verdict::NonRetriable(NonRetriable::Fail) => "fail".to_string(),
    }
}
