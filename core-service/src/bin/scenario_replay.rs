//! Scenario Replay
//!
//! Runs the built-in attack scenarios against an in-process engine and
//! prints each verdict.
//!
//! ```text
//! scenario-replay [--scenario <name>]... [--session <prefix>] [--config <path>]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use phantomshield_core::constants::{APP_NAME, APP_VERSION};
use phantomshield_core::scenarios::{default_start, Scenario};
use phantomshield_core::{ConfigStore, Engine, EngineConfig, EngineError, MemorySink};

#[derive(Parser, Debug)]
#[command(name = "scenario-replay", version, about, long_about = None)]
struct Args {
    /// Scenario to replay; repeat for several, omit for all
    #[arg(short, long, value_enum)]
    scenario: Vec<Scenario>,

    /// Session id prefix; the scenario name is appended
    #[arg(long, default_value = "replay")]
    session: String,

    /// Engine config file (JSON); built-in defaults otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn scenarios(&self) -> Vec<Scenario> {
        if self.scenario.is_empty() {
            Scenario::ALL.to_vec()
        } else {
            self.scenario.clone()
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        log::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), EngineError> {
    log::info!("{} v{} scenario replay", APP_NAME, APP_VERSION);

    let store = match &args.config {
        Some(path) => ConfigStore::from_file(path)?,
        None => ConfigStore::new(EngineConfig::default())?,
    };
    let engine = Engine::new(Arc::new(store), Arc::new(MemorySink::new()));

    for scenario in args.scenarios() {
        println!("\n=== {} ===", scenario.as_str());
        println!("{:>4}  {:<28} {:>7}  {:<10} {:<24} rules", "#", "route", "score", "verdict", "reason");

        let session_id = format!("{}-{}", args.session, scenario.as_str());
        for (i, request) in scenario.requests(&session_id, default_start()).into_iter().enumerate() {
            let route = request.route.clone();
            let d = engine.evaluate(request).await;
            println!(
                "{:>4}  {:<28} {:>7.3}  {:<10} {:<24} {}",
                i,
                route,
                d.score,
                d.verdict.as_str(),
                d.reason.as_str(),
                d.fired_rules.join(",")
            );
        }

        let timeline = engine.timeline(&session_id).await?;
        println!(
            "-> {} forensic records, peak score {:.3}, final verdict {}",
            timeline.record_count,
            timeline.peak_score,
            timeline.last_verdict.map(|v| v.as_str()).unwrap_or("REAL")
        );
    }

    engine.forensics().wait_idle().await;
    let stats = engine.stats();
    println!(
        "\n{} evaluations, {} escalations to DECOY, {} forensic records durable",
        stats.evaluations, stats.decoy_escalations, stats.forensics.durable
    );
    Ok(())
}
