use anyhow::Result;
use serde::Serialize;

use crate::output::config::{OutputConfig, OutputFormat};
use crate::output::presenter::Emitter;
use crate::output::types::{Envelope, Meta};

use super::config;

/// Wraps `result` in the versioned envelope and writes it to stdout.
pub fn print_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    let mut cfg = OutputConfig::from_env();
    if config::json_mode() { cfg.format = OutputFormat::Json; }
    Emitter::from_env(cfg).emit(&env)?;
    Ok(())
}
