//! `lcc check` – validate stream filters in the loaded config.

use anyhow::{bail, Result};
use lcc_core::config::LccConfig;
use lcc_core::factory::check_filters;

pub fn run_check(cfg: &LccConfig) -> Result<()> {
    let mut bad = 0usize;
    for stream in &cfg.streams {
        for err in check_filters(stream) {
            println!("{}: {}", stream.name, err);
            bad += 1;
        }
    }
    if bad > 0 {
        bail!("{} invalid predicate(s)", bad);
    }
    println!("{} stream(s) ok", cfg.streams.len());
    Ok(())
}
