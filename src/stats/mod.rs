use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::model::NormalizedJob;
use crate::telemetry::{self};
use crate::telemetry::ops::stats::Phase as StatsPhase;
use crate::util::input::read_json;

pub mod aggregate;
pub mod types;

#[derive(Args, Debug)]
pub struct StatsCmd {
    /// JSON array of normalized jobs, or a dispatch result; `-` reads stdin
    #[arg(long)]
    pub jobs: PathBuf,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum JobsInput {
    List(Vec<NormalizedJob>),
    Dispatch { jobs: Vec<NormalizedJob> },
    // `harvest --json dispatch` output
    Envelope { result: Box<JobsInput> },
}

impl JobsInput {
    fn into_jobs(self) -> Vec<NormalizedJob> {
        match self {
            JobsInput::List(jobs) | JobsInput::Dispatch { jobs } => jobs,
            JobsInput::Envelope { result } => result.into_jobs(),
        }
    }
}

pub async fn run(args: StatsCmd) -> Result<()> {
    let log = telemetry::stats();
    let started = std::time::Instant::now();
    let _g = log.root_span_kv([("jobs", args.jobs.display().to_string())]).entered();

    let jobs = read_json::<JobsInput>(&args.jobs)?.into_jobs();
    let stats = {
        let _s = log.span_kv(&StatsPhase::Aggregate, [("jobs", jobs.len().to_string())]).entered();
        aggregate::batch_statistics(&jobs)
    };

    if telemetry::config::json_mode() { log.result_timed(&stats, started.elapsed())?; }
    else {
        log.info(format!("📊 {} job(s), {} unique skill(s), {:.2} skill(s) per job", jobs.len(), stats.total_unique_skills, stats.average_skills_per_job));
        for (name, s) in &stats.skills.0 {
            log.info(format!("  {:<24} {:>4}  {:>6.2}%  {}", name, s.count, s.percentage, s.importance.as_str()));
        }
        log.result_timed(&stats, started.elapsed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_input_shapes() {
        let job = r#"{"title": "Dev", "company": "Co", "description": "Dev", "url": null, "source": "remotive", "skills": [{"name": "PHP", "type": "technical"}]}"#;
        let list = format!("[{job}]");
        let dispatch = format!(r#"{{"query": "php", "totalJobs": 1, "jobs": [{job}]}}"#);
        let envelope = format!(r#"{{"schema_version": "harvest.v1", "op": "dispatch", "result": {dispatch}}}"#);
        for input in [list, dispatch, envelope] {
            let jobs = serde_json::from_str::<JobsInput>(&input).unwrap().into_jobs();
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].skills[0].name, "PHP");
        }
    }
}
