use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod acquire;
mod config;
mod error;
mod model;
mod output;
mod skills;
mod stats;
mod telemetry;
mod util;

use acquire::AcquireContext;
use config::HarvestConfig;

#[derive(Parser)]
#[command(name = "harvest", about = "Job listing acquisition and skill statistics CLI")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Dispatch(acquire::DispatchCmd),
    Probe(acquire::probe::ProbeCmd),
    Stats(stats::StatsCmd),
    Skills(skills::SkillsCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and HARVEST_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Stats(args) => stats::run(args).await?,
        Commands::Skills(args) => {
            let extractor = skills::SkillExtractor::from_config(&HarvestConfig::from_env())?;
            skills::run(&extractor, args).await?
        }
        Commands::Dispatch(args) => acquire::run(&context()?, args).await?,
        Commands::Probe(args) => acquire::probe::run(&context()?, args).await?,
    }

    Ok(())
}

fn context() -> Result<AcquireContext> {
    let ctx = AcquireContext::new(HarvestConfig::from_env())?;
    let caps = &ctx.capabilities;
    tracing::info!(
        browser = caps.browser,
        nlp = caps.nlp,
        chromium = ?caps.chromium,
        "capabilities detected"
    );
    Ok(ctx)
}
