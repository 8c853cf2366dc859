use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use tracing::Instrument;

use crate::error::AcquireError;
use crate::model::SourceDescriptor;
use crate::telemetry::{self};
use crate::telemetry::ops::probe::Phase as ProbePhase;
use crate::util::input::read_json;

use super::dispatcher::SourceDispatcher;
use super::types::{ProbeInput, ProbeReport};
use super::AcquireContext;

pub const DEFAULT_PROBE_QUERY: &str = "developer";
pub const DEFAULT_PROBE_MAX: usize = 5;

/// harvest probe: run one source and report what came back
#[derive(Args, Debug)]
pub struct ProbeCmd {
    /// Descriptor (or `{source, query?, maxResults?}`) as JSON; `-` reads stdin
    #[arg(long)]
    source: PathBuf,
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    max_results: Option<usize>,
}

/// Unlike dispatch, the probe surfaces the failure text instead of an
/// empty list.
pub async fn probe_source(ctx: &AcquireContext, source: &SourceDescriptor, query: &str, max_results: usize) -> ProbeReport {
    let log = telemetry::probe();
    let span = log.span_kv(&ProbePhase::Fetch, [("source", source.name.clone())]);
    let deadline = ctx.config.dispatch_deadline;
    let fetched = tokio::time::timeout(deadline, SourceDispatcher::new(ctx).try_source(source, query, max_results))
        .instrument(span)
        .await
        .unwrap_or(Err(AcquireError::Timeout(deadline)));
    match fetched {
        Ok(mut jobs) => {
            jobs.truncate(max_results);
            let total = jobs.len();
            let message = if total > 0 {
                format!("Fetched {total} job(s) from {}", source.name)
            } else {
                format!("{} responded but returned no jobs for '{query}'", source.name)
            };
            ProbeReport { success: total > 0, source_name: source.name.clone(), total_fetched: total, jobs, message }
        }
        Err(e) => {
            log.warn_kv(&format!("⚠️ Probe of '{}' failed: {e}", source.name), [("source", source.name.clone()), ("error", e.to_string())]);
            ProbeReport { success: false, source_name: source.name.clone(), total_fetched: 0, jobs: Vec::new(), message: e.to_string() }
        }
    }
}

pub async fn run(ctx: &AcquireContext, args: ProbeCmd) -> Result<()> {
    let log = telemetry::probe();
    let (source, file_query, file_max) = match read_json::<ProbeInput>(&args.source)? {
        ProbeInput::Request(r) => (r.source, r.query, r.max_results),
        ProbeInput::Single(s) => (s, None, None),
    };
    let query = args.query.or(file_query).unwrap_or_else(|| DEFAULT_PROBE_QUERY.to_string());
    let max_results = args.max_results.or(file_max).unwrap_or(DEFAULT_PROBE_MAX);

    let started = Instant::now();
    let root = log.root_span_kv([
        ("source", source.name.clone()),
        ("kind", source.kind.as_str().to_string()),
        ("query", query.clone()),
        ("max_results", max_results.to_string()),
    ]);
    let report = probe_source(ctx, &source, &query, max_results).instrument(root).await;
    let elapsed = started.elapsed();
    if telemetry::config::json_mode() { log.result_timed(&report, elapsed)?; }
    else {
        let mark = if report.success { "✅" } else { "❌" };
        log.info(format!("{mark} {}", report.message));
        for job in &report.jobs { log.info(format!("  • {} @ {}", job.title, job.company)); }
        log.result_timed(&report, elapsed)?;
    }
    Ok(())
}
