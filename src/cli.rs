//! Command-line surface.
//!
//! Every simulation flag is optional: a flag given on the command line wins
//! over the config file, which wins over the built-in defaults.

use clap::Parser;

use crate::config::{SimulationConfig, DEFAULT_CONFIG_FILE};
use crate::types::SimulationParameters;

/// Simulate noisy binary-search pooled testing
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "grouptest")]
#[command(about = "Estimate tests consumed and error rates of binary-search group testing")]
pub struct Cli {
    /// Number of independent trials to average over
    #[arg(short = 't', long = "simulate-num", visible_alias = "trial-count")]
    pub trial_count: Option<usize>,

    /// Initial pool size
    #[arg(short, long)]
    pub block_size: Option<usize>,

    /// Number of samples per trial
    #[arg(short, long = "sample-num")]
    pub sample_count: Option<usize>,

    /// Rate of samples that are infected
    #[arg(short, long)]
    pub infected_rate: Option<f64>,

    /// False positive rate of a single pooled test
    #[arg(short = 'p', long = "false-positive")]
    pub false_positive_rate: Option<f64>,

    /// False negative rate of a single pooled test
    #[arg(short = 'n', long = "false-negative")]
    pub false_negative_rate: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long, env = "GROUPTEST_SEED")]
    pub seed: Option<u64>,

    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Merge command-line overrides onto the configured values.
    pub fn resolve(&self, cfg: &SimulationConfig) -> (SimulationParameters, Option<u64>) {
        let base = cfg.parameters();
        let params = SimulationParameters {
            trial_count: self.trial_count.unwrap_or(base.trial_count),
            block_size: self.block_size.unwrap_or(base.block_size),
            sample_count: self.sample_count.unwrap_or(base.sample_count),
            infected_rate: self.infected_rate.unwrap_or(base.infected_rate),
            false_positive_rate: self.false_positive_rate.unwrap_or(base.false_positive_rate),
            false_negative_rate: self.false_negative_rate.unwrap_or(base.false_negative_rate),
        };
        (params, self.seed.or(cfg.seed))
    }
}
