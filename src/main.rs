//! GROUPTEST: Monte Carlo simulator for noisy binary-search pooled testing
//!
//! Entry point. Loads configuration, applies command-line overrides,
//! validates the parameters, runs the simulation and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use grouptest::cli::Cli;
use grouptest::config::AppConfig;
use grouptest::simulation::GroupTestSimulator;
use grouptest::types::{ResultRecord, SimulationParameters};

/// Machine-readable report for `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    parameters: &'a SimulationParameters,
    seed: u64,
    result: ResultRecord,
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    init_logging();

    let cfg = AppConfig::load_or_default(&cli.config)?;
    let (params, seed) = cli.resolve(&cfg.simulation);
    params.validate()?;

    let simulator = match seed {
        Some(seed) => GroupTestSimulator::with_seed(params, seed),
        None => GroupTestSimulator::new(params),
    };
    info!(seed = simulator.seed(), "Simulator ready");

    let record = simulator.run()?;

    if cli.json {
        let report = JsonReport {
            parameters: simulator.params(),
            seed: simulator.seed(),
            result: record,
        };
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialise report")?;
        println!("{json}");
    } else {
        println!("{}", simulator.params());
        println!("{}", "-".repeat(40));
        println!("{record}");
    }

    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout only
/// carries the report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grouptest=warn"));

    let json_logging = std::env::var("GROUPTEST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
