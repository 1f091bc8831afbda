//! Configuration loading from TOML.
//!
//! Reads `grouptest.toml` (if present) and deserializes it into typed
//! defaults for the simulation. Every key is optional; anything missing
//! falls back to the built-in defaults. Command-line flags override the
//! values loaded here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::types::SimulationParameters;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "grouptest.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
}

/// The `[simulation]` table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub trial_count: usize,
    pub block_size: usize,
    pub sample_count: usize,
    pub infected_rate: f64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,
    /// Fixed seed for reproducible runs. Random when unset.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let defaults = SimulationParameters::default();
        Self {
            trial_count: defaults.trial_count,
            block_size: defaults.block_size,
            sample_count: defaults.sample_count,
            infected_rate: defaults.infected_rate,
            false_positive_rate: defaults.false_positive_rate,
            false_negative_rate: defaults.false_negative_rate,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// The configured parameters, before any command-line overrides.
    pub fn parameters(&self) -> SimulationParameters {
        SimulationParameters {
            trial_count: self.trial_count,
            block_size: self.block_size,
            sample_count: self.sample_count,
            infected_rate: self.infected_rate,
            false_positive_rate: self.false_positive_rate,
            false_negative_rate: self.false_negative_rate,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration from `path`, or use built-in defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        info!(path, "Config loaded");
        Ok(config)
    }
}
