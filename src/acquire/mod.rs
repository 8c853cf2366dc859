use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use reqwest::Client;
use serde_json::Value;
use tracing::Instrument;

use crate::config::HarvestConfig;
use crate::skills::SkillExtractor;
use crate::stats::aggregate::batch_statistics;
use crate::telemetry::{self};
use crate::util::input::read_json;

pub mod api;
pub mod capabilities;
pub mod dispatcher;
pub mod html;
pub mod pacing;
pub mod probe;
pub mod samples;
pub mod types;

use capabilities::Capabilities;
use dispatcher::SourceDispatcher;
use types::{DispatchOutput, DispatchReport, DispatchRequest, SourcesInput};

pub const DEFAULT_MAX_RESULTS: usize = 30;

/// Everything a fetch strategy needs, built once per process and borrowed.
pub struct AcquireContext {
    pub config: HarvestConfig,
    pub capabilities: Capabilities,
    pub skills: Arc<SkillExtractor>,
    pub http: Client,
}

impl AcquireContext {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let skills = Arc::new(SkillExtractor::from_config(&config)?);
        let capabilities = Capabilities::detect(&config);
        let http = Client::builder()
            .connect_timeout(config.api_timeout)
            .build()?;
        Ok(Self { config, capabilities, skills, http })
    }
}

/// Query-parameter rendering for descriptor `params` values.
pub(crate) fn param_to_string(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> AcquireContext {
    use crate::acquire::pacing::DelayWindow;
    use crate::skills::taxonomy::Taxonomy;

    let mut config = HarvestConfig::default();
    config.browser.disabled = true;
    config.browser.settle_delay = DelayWindow::ZERO;
    config.page_delay = DelayWindow::ZERO;
    config.seed = Some(1);
    AcquireContext {
        config,
        capabilities: Capabilities::default(),
        skills: Arc::new(SkillExtractor::new(Taxonomy::builtin(), None)),
        http: Client::new(),
    }
}

#[derive(Args, Debug)]
pub struct DispatchCmd {
    /// Search query; overrides any `query` in the sources file
    query: Option<String>,
    /// Descriptor array or request object as JSON; `-` reads stdin
    #[arg(long, required_unless_present = "samples")]
    sources: Option<PathBuf>,
    /// Upper bound on returned jobs (default 30)
    #[arg(long)]
    max_results: Option<usize>,
    /// Sources fetched at once; results keep source order
    #[arg(long)]
    concurrency: Option<usize>,
    /// Attach skill frequency statistics to the result
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Return canned listings instead of contacting any source
    #[arg(long, default_value_t = false, conflicts_with = "sources")]
    samples: bool,
}

pub async fn run(ctx: &AcquireContext, args: DispatchCmd) -> Result<()> {
    let log = telemetry::dispatch();
    let started = std::time::Instant::now();
    let request = match &args.sources {
        Some(path) => read_json::<SourcesInput>(path)?.into_request(),
        None => DispatchRequest::default(),
    };
    let Some(query) = args.query.or(request.query) else {
        bail!("no query given: pass one on the command line or set `query` in the sources file");
    };
    let max_results = args.max_results.or(request.max_results).unwrap_or(DEFAULT_MAX_RESULTS);
    let concurrency = args.concurrency.unwrap_or(ctx.config.concurrency);

    let root = log.root_span_kv([
        ("query", query.clone()),
        ("sources", request.sources.len().to_string()),
        ("max_results", max_results.to_string()),
        ("concurrency", concurrency.to_string()),
        ("samples", args.samples.to_string()),
    ]);

    let report = if args.samples {
        log.info(format!("🧪 Returning up to {} sample job(s) for '{}'", max_results, query));
        DispatchReport { jobs: samples::sample_jobs(max_results, ctx.skills.taxonomy()), sources: Vec::new() }
    } else {
        log.info(format!("🚀 Dispatching '{}' across {} source(s)", query, request.sources.len()));
        SourceDispatcher::new(ctx)
            .with_concurrency(concurrency)
            .dispatch_report(&request.sources, &query, max_results)
            .instrument(root)
            .await
    };

    let statistics = args.stats.then(|| batch_statistics(&report.jobs));
    let output = DispatchOutput {
        query,
        total_jobs: report.jobs.len(),
        jobs: report.jobs,
        statistics,
        sources: report.sources,
    };
    let elapsed = started.elapsed();

    if telemetry::config::json_mode() { log.result_timed(&output, elapsed)?; }
    else {
        log.info(format!("✅ Collected {} job(s)", output.total_jobs));
        for job in &output.jobs {
            log.info(format!("  • {} @ {} [{}] skills={}", job.title, job.company, job.source, job.skills.len()));
        }
        if let Some(stats) = &output.statistics {
            log.info(format!("📊 {} unique skill(s), {:.2} per job", stats.total_unique_skills, stats.average_skills_per_job));
        }
        log.result_timed(&output, elapsed)?;
    }
    Ok(())
}
