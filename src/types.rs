//! Shared types for the GROUPTEST simulator.
//!
//! The parameter set, the aggregated result record and the error enum live
//! here so the simulation, config and CLI modules can depend on them without
//! depending on each other.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// The six scalars that fully describe one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Number of independent trials to average over.
    pub trial_count: usize,
    /// Size of the initial pools. Only the first partition uses it; every
    /// later split bisects the current pool.
    pub block_size: usize,
    /// Samples per trial.
    pub sample_count: usize,
    /// Fraction of samples truly infected (0.0 to 1.0).
    pub infected_rate: f64,
    /// Probability a truly-negative pool reads positive (0.0 to 1.0).
    pub false_positive_rate: f64,
    /// Probability a truly-positive pool reads negative (0.0 to 1.0).
    pub false_negative_rate: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            trial_count: 100,
            block_size: 32,
            sample_count: 256,
            infected_rate: 0.3,
            false_positive_rate: 0.1,
            false_negative_rate: 0.1,
        }
    }
}

impl SimulationParameters {
    /// Check every parameter against its allowed range.
    ///
    /// The simulator itself never calls this; callers validate once before
    /// handing the parameters over.
    pub fn validate(&self) -> Result<(), GroupTestError> {
        check_positive("trial_count", self.trial_count)?;
        check_positive("block_size", self.block_size)?;
        check_positive("sample_count", self.sample_count)?;
        check_rate("infected_rate", self.infected_rate)?;
        check_rate("false_positive_rate", self.false_positive_rate)?;
        check_rate("false_negative_rate", self.false_negative_rate)?;
        Ok(())
    }

    /// Number of truly infected samples in every trial's population.
    ///
    /// Halves round to the nearest even count.
    pub fn infected_count(&self) -> usize {
        let exact = self.sample_count as f64 * self.infected_rate;
        (exact.round_ties_even().max(0.0) as usize).min(self.sample_count)
    }

    /// Number of pools the initial partition produces.
    pub fn initial_pool_count(&self) -> usize {
        if self.block_size == 0 {
            return 0;
        }
        self.sample_count.div_ceil(self.block_size)
    }
}

fn check_positive(name: &'static str, value: usize) -> Result<(), GroupTestError> {
    if value == 0 {
        return Err(GroupTestError::InvalidParameter {
            name,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

fn check_rate(name: &'static str, value: f64) -> Result<(), GroupTestError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GroupTestError::InvalidParameter {
            name,
            reason: format!("must be within 0.0..=1.0, got {value}"),
        });
    }
    Ok(())
}

impl fmt::Display for SimulationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulate num:        {}", self.trial_count)?;
        writeln!(f, "Block size:          {}", self.block_size)?;
        writeln!(f, "Sample num:          {}", self.sample_count)?;
        writeln!(f, "Infected rate:       {}", self.infected_rate)?;
        writeln!(f, "False positive rate: {}", self.false_positive_rate)?;
        write!(f, "False negative rate: {}", self.false_negative_rate)
    }
}

// ---------------------------------------------------------------------------
// Assay readings
// ---------------------------------------------------------------------------

/// What a pooled test reports, which may differ from the truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reading {
    Positive,
    Negative,
}

impl Reading {
    pub fn is_positive(self) -> bool {
        self == Reading::Positive
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Positive => write!(f, "POSITIVE"),
            Reading::Negative => write!(f, "NEGATIVE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Averaged outcome of a full simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Mean pooled tests ("PCR count") consumed per trial.
    pub average_tests_per_trial: f64,
    /// Healthy samples resolved infected, per sample per trial.
    pub average_false_positive_rate: f64,
    /// Infected samples resolved healthy, per sample per trial.
    pub average_false_negative_rate: f64,
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average number of times PCR: {}", self.average_tests_per_trial)?;
        writeln!(
            f,
            "Average binary search false positive rate: {}",
            self.average_false_positive_rate
        )?;
        write!(
            f,
            "Average binary search false negative rate: {}",
            self.average_false_negative_rate
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GROUPTEST.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GroupTestError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Internal consistency error: sample {index} resolved twice")]
    IndexWrittenTwice { index: usize },

    #[error("Internal consistency error: sample {index} never resolved")]
    IndexUnresolved { index: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
