//! Simulation engine: population setup, pool resolution, reconciliation
//! and aggregation.
//!
//! Each trial draws a fresh population, tests it in pools of `block_size`,
//! bisects every pool that reads positive until it reaches single samples,
//! then compares the resolved statuses against the truth.

pub mod assay;
pub mod pool;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::types::{GroupTestError, Reading, ResultRecord, SimulationParameters};
use assay::{Assay, NoisyAssay};
use pool::{Pool, PoolStack};

/// ChaCha stream lanes within a trial.
const POPULATION_LANE: u64 = 0;
const ASSAY_LANE: u64 = 1;

// ---------------------------------------------------------------------------
// Trial outcome
// ---------------------------------------------------------------------------

/// Everything one trial produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    /// True status per sample (`true` = infected).
    pub ground_truth: Vec<bool>,
    /// Status each sample was resolved to, index-aligned with the truth.
    pub resolved: Vec<bool>,
    pub tests_consumed: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

/// Running sums over completed trials.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTotals {
    pub trials: u64,
    pub tests_consumed: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl SimulationTotals {
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.tests_consumed += outcome.tests_consumed;
        self.false_positives += outcome.false_positives;
        self.false_negatives += outcome.false_negatives;
    }

    /// Average over the recorded trials. Empty denominators give 0.0.
    pub fn average(&self, sample_count: usize) -> ResultRecord {
        let per_trial = |total: u64| {
            if self.trials == 0 {
                0.0
            } else {
                total as f64 / self.trials as f64
            }
        };
        let per_sample = |total: u64| {
            let denom = self.trials as f64 * sample_count as f64;
            if denom == 0.0 {
                0.0
            } else {
                total as f64 / denom
            }
        };

        ResultRecord {
            average_tests_per_trial: per_trial(self.tests_consumed),
            average_false_positive_rate: per_sample(self.false_positives),
            average_false_negative_rate: per_sample(self.false_negatives),
        }
    }
}

// ---------------------------------------------------------------------------
// Trial mechanics
// ---------------------------------------------------------------------------

/// Build a population with exactly `infected_count` infected samples in
/// uniformly random positions.
pub fn generate_population<R: Rng + ?Sized>(
    sample_count: usize,
    infected_count: usize,
    rng: &mut R,
) -> Vec<bool> {
    let mut samples: Vec<bool> = (0..sample_count).map(|i| i < infected_count).collect();
    samples.shuffle(rng);
    samples
}

/// Write-once resolution slots, one per sample.
#[derive(Debug)]
pub struct OutcomeSlots {
    slots: Vec<Option<bool>>,
}

impl OutcomeSlots {
    pub fn new(sample_count: usize) -> Self {
        Self { slots: vec![None; sample_count] }
    }

    /// Resolve every sample in `pool` to `infected`.
    pub fn resolve(&mut self, pool: Pool, infected: bool) -> Result<(), GroupTestError> {
        for index in pool.start..pool.end() {
            let slot = &mut self.slots[index];
            if slot.is_some() {
                error!(index, start = pool.start, len = pool.len, "Sample resolved twice");
                return Err(GroupTestError::IndexWrittenTwice { index });
            }
            *slot = Some(infected);
        }
        Ok(())
    }

    /// Unwrap into the resolved vector, failing on any unresolved sample.
    pub fn finish(self) -> Result<Vec<bool>, GroupTestError> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    error!(index, "Sample never resolved");
                    GroupTestError::IndexUnresolved { index }
                })
            })
            .collect()
    }
}

/// Resolve a population by binary-search pooling and score the result.
///
/// Pools come off a depth-first stack; a positive reading on a multi-sample
/// pool costs one test and queues both halves, a positive singleton resolves
/// infected, and a negative reading clears the whole pool.
pub fn resolve_trial<A: Assay + ?Sized>(
    ground_truth: Vec<bool>,
    block_size: usize,
    assay: &mut A,
) -> Result<TrialOutcome, GroupTestError> {
    let mut slots = OutcomeSlots::new(ground_truth.len());
    let mut pending = PoolStack::partition(ground_truth.len(), block_size);
    let mut tests_consumed = 0u64;

    while let Some(pool) = pending.pop() {
        tests_consumed += 1;
        let truly_positive = pool.contains_infected(&ground_truth);

        match assay.read(&pool, truly_positive) {
            Reading::Negative => slots.resolve(pool, false)?,
            Reading::Positive if pool.is_singleton() => slots.resolve(pool, true)?,
            Reading::Positive => {
                let (lower, upper) = pool.split();
                pending.push_halves(lower, upper);
            }
        }
    }

    let resolved = slots.finish()?;
    let (false_positives, false_negatives) = reconcile(&ground_truth, &resolved);

    Ok(TrialOutcome {
        ground_truth,
        resolved,
        tests_consumed,
        false_positives,
        false_negatives,
    })
}

/// Count (false positives, false negatives) between truth and resolution.
pub fn reconcile(ground_truth: &[bool], resolved: &[bool]) -> (u64, u64) {
    ground_truth
        .iter()
        .zip(resolved)
        .fold((0, 0), |(fp, fn_), (&truth, &outcome)| match (truth, outcome) {
            (false, true) => (fp + 1, fn_),
            (true, false) => (fp, fn_ + 1),
            _ => (fp, fn_),
        })
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Runs repeated independent trials and averages them.
///
/// All randomness derives from a single `seed`: trial `k` uses two ChaCha
/// streams of that seed, one to shuffle its population and one for assay
/// noise, so any trial can be replayed on its own.
pub struct GroupTestSimulator {
    params: SimulationParameters,
    seed: u64,
}

impl GroupTestSimulator {
    /// Create a simulator with a fresh random seed.
    pub fn new(params: SimulationParameters) -> Self {
        Self::with_seed(params, rand::random())
    }

    pub fn with_seed(params: SimulationParameters, seed: u64) -> Self {
        Self { params, seed }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run every trial with the noisy assay and average the outcomes.
    pub fn run(&self) -> Result<ResultRecord, GroupTestError> {
        self.aggregate(|sim, trial| sim.run_trial(trial))
    }

    /// Run every trial against a caller-supplied assay, shared across
    /// trials. Populations are still drawn from the simulator's seed.
    pub fn run_with_assay<A: Assay + ?Sized>(
        &self,
        assay: &mut A,
    ) -> Result<ResultRecord, GroupTestError> {
        self.aggregate(|sim, trial| sim.run_trial_with_assay(trial, assay))
    }

    /// Run trial number `trial` with the noisy assay.
    pub fn run_trial(&self, trial: u64) -> Result<TrialOutcome, GroupTestError> {
        let mut assay = NoisyAssay::new(
            self.params.false_positive_rate,
            self.params.false_negative_rate,
            self.stream(trial, ASSAY_LANE),
        );
        self.run_trial_with_assay(trial, &mut assay)
    }

    /// Run trial number `trial` against `assay`.
    pub fn run_trial_with_assay<A: Assay + ?Sized>(
        &self,
        trial: u64,
        assay: &mut A,
    ) -> Result<TrialOutcome, GroupTestError> {
        let mut rng = self.stream(trial, POPULATION_LANE);
        let ground_truth = generate_population(
            self.params.sample_count,
            self.params.infected_count(),
            &mut rng,
        );
        resolve_trial(ground_truth, self.params.block_size, assay)
    }

    fn aggregate<F>(&self, mut trial_fn: F) -> Result<ResultRecord, GroupTestError>
    where
        F: FnMut(&Self, u64) -> Result<TrialOutcome, GroupTestError>,
    {
        info!(
            trials = self.params.trial_count,
            block_size = self.params.block_size,
            samples = self.params.sample_count,
            infected_rate = self.params.infected_rate,
            false_positive_rate = self.params.false_positive_rate,
            false_negative_rate = self.params.false_negative_rate,
            seed = self.seed,
            "Starting simulation"
        );

        if self.params.sample_count == 0 {
            warn!("Empty population; every trial resolves without testing");
        }

        let mut totals = SimulationTotals::default();
        for trial in 0..self.params.trial_count as u64 {
            let outcome = trial_fn(self, trial)?;
            debug!(
                trial,
                tests = outcome.tests_consumed,
                false_positives = outcome.false_positives,
                false_negatives = outcome.false_negatives,
                "Trial complete"
            );
            totals.record(&outcome);
        }

        let record = totals.average(self.params.sample_count);
        info!(
            avg_tests = record.average_tests_per_trial,
            fp_rate = record.average_false_positive_rate,
            fn_rate = record.average_false_negative_rate,
            "Simulation complete"
        );
        Ok(record)
    }

    /// Independent ChaCha stream for one lane of one trial.
    fn stream(&self, trial: u64, lane: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream((trial << 1) | lane);
        rng
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
