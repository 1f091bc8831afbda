//! Pooled test models.
//!
//! An [`Assay`] turns the truth about a pool into what the test reports.
//! [`NoisyAssay`] is the model the simulator runs with; tests swap in
//! scripted assays to force specific readings.

use rand::Rng;
use tracing::trace;

use super::pool::Pool;
use crate::types::Reading;

/// Abstraction over a pooled test.
#[cfg_attr(test, mockall::automock)]
pub trait Assay {
    /// Report a reading for `pool`, whose true status is `truly_positive`.
    fn read(&mut self, pool: &Pool, truly_positive: bool) -> Reading;
}

/// A test that misreports with fixed per-test error rates.
///
/// A truly positive pool reads negative with probability
/// `false_negative_rate`; a truly negative pool reads positive with
/// probability `false_positive_rate`. Exactly one draw per reading.
pub struct NoisyAssay<R> {
    false_positive_rate: f64,
    false_negative_rate: f64,
    rng: R,
}

impl<R: Rng> NoisyAssay<R> {
    pub fn new(false_positive_rate: f64, false_negative_rate: f64, rng: R) -> Self {
        Self {
            false_positive_rate,
            false_negative_rate,
            rng,
        }
    }
}

impl<R: Rng> Assay for NoisyAssay<R> {
    fn read(&mut self, pool: &Pool, truly_positive: bool) -> Reading {
        // Strict `<` against a draw in [0, 1): a rate of 0 never flips and a
        // rate of 1 always does.
        let draw: f64 = self.rng.gen();
        let reading = if truly_positive {
            if draw < self.false_negative_rate {
                Reading::Negative
            } else {
                Reading::Positive
            }
        } else if draw < self.false_positive_rate {
            Reading::Positive
        } else {
            Reading::Negative
        };

        trace!(
            start = pool.start,
            len = pool.len,
            truly_positive,
            %reading,
            "Pool tested"
        );
        reading
    }
}

/// A test that always reports the truth.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerfectAssay;

impl Assay for PerfectAssay {
    fn read(&mut self, _pool: &Pool, truly_positive: bool) -> Reading {
        if truly_positive {
            Reading::Positive
        } else {
            Reading::Negative
        }
    }
}
