//! End-to-end simulation runs.
//!
//! Drives the simulator through the public API with both the noisy assay and
//! scripted assays, plus the config → CLI → validate path the binary uses.

use clap::Parser;
use grouptest::cli::Cli;
use grouptest::config::AppConfig;
use grouptest::simulation::pool::Pool;
use grouptest::simulation::GroupTestSimulator;
use grouptest::types::{GroupTestError, SimulationParameters};

use crate::scripted_assay::{Script, ScriptedAssay};

fn params(
    trial_count: usize,
    block_size: usize,
    sample_count: usize,
    infected_rate: f64,
) -> SimulationParameters {
    SimulationParameters {
        trial_count,
        block_size,
        sample_count,
        infected_rate,
        false_positive_rate: 0.0,
        false_negative_rate: 0.0,
    }
}

#[test]
fn test_always_positive_exhausts_every_block() {
    let sim = GroupTestSimulator::with_seed(params(10, 32, 256, 0.3), 1);
    let mut assay = ScriptedAssay::new(Script::AlwaysPositive);
    let record = sim.run_with_assay(&mut assay).unwrap();

    // Each 32-sample block bisects fully: 2 * 32 - 1 tests.
    assert_eq!(record.average_tests_per_trial, 8.0 * 63.0);
    assert_eq!(assay.reads(), 10 * 8 * 63);
    // 77 of 256 infected; every healthy sample is flagged.
    assert!((record.average_false_positive_rate - 179.0 / 256.0).abs() < 1e-12);
    assert_eq!(record.average_false_negative_rate, 0.0);
}

#[test]
fn test_always_negative_tests_each_block_once() {
    let sim = GroupTestSimulator::with_seed(params(10, 32, 256, 0.3), 2);
    let mut assay = ScriptedAssay::new(Script::AlwaysNegative);
    let record = sim.run_with_assay(&mut assay).unwrap();

    assert_eq!(record.average_tests_per_trial, 8.0);
    assert_eq!(record.average_false_positive_rate, 0.0);
    assert!((record.average_false_negative_rate - 77.0 / 256.0).abs() < 1e-12);
}

#[test]
fn test_missed_singletons_become_false_negatives() {
    let sim = GroupTestSimulator::with_seed(params(5, 16, 128, 0.1), 3);
    let mut assay = ScriptedAssay::new(Script::MissPoolsOfLen(1));
    let outcome = sim.run_trial_with_assay(0, &mut assay).unwrap();

    assert!(outcome.resolved.iter().all(|&infected| !infected));
    assert_eq!(outcome.false_negatives, 13);
    assert_eq!(outcome.false_positives, 0);
}

#[test]
fn test_truncated_last_block() {
    let sim = GroupTestSimulator::with_seed(params(1, 3, 10, 0.0), 4);
    let mut assay = ScriptedAssay::new(Script::Truthful);
    let outcome = sim.run_trial_with_assay(0, &mut assay).unwrap();

    assert_eq!(outcome.tests_consumed, 4);
    assert_eq!(
        assay.log(),
        &[Pool::new(0, 3), Pool::new(3, 3), Pool::new(6, 3), Pool::new(9, 1)]
    );
}

#[test]
fn test_reads_follow_depth_first_order() {
    let sim = GroupTestSimulator::with_seed(params(1, 16, 64, 0.2), 5);
    let mut assay = ScriptedAssay::new(Script::Truthful);
    let outcome = sim.run_trial_with_assay(0, &mut assay).unwrap();
    assert_eq!(outcome.resolved, outcome.ground_truth);

    let log = assay.log();
    for window in log.windows(2) {
        let (prev, next) = (window[0], window[1]);
        let prev_split = prev.len > 1
            && outcome.ground_truth[prev.start..prev.end()].iter().any(|&x| x);
        if prev_split {
            // A split pool is followed straight away by its lower half.
            assert_eq!(next, prev.split().0);
        } else {
            // Otherwise the next pool picks up where this one ended.
            assert_eq!(next.start, prev.end());
        }
    }
}

#[test]
fn test_single_infected_in_four() {
    let sim = GroupTestSimulator::with_seed(params(1, 4, 4, 0.25), 6);
    let outcome = sim.run_trial(0).unwrap();

    let infected: Vec<usize> = outcome
        .resolved
        .iter()
        .enumerate()
        .filter_map(|(i, &x)| x.then_some(i))
        .collect();
    let truly_infected: Vec<usize> = outcome
        .ground_truth
        .iter()
        .enumerate()
        .filter_map(|(i, &x)| x.then_some(i))
        .collect();

    assert_eq!(infected.len(), 1);
    assert_eq!(infected, truly_infected);
    assert!(outcome.tests_consumed >= 3 && outcome.tests_consumed <= 5);
}

#[test]
fn test_healthy_population_exact_average() {
    let sim = GroupTestSimulator::with_seed(params(1000, 32, 256, 0.0), 7);
    let record = sim.run().unwrap();
    assert_eq!(record.average_tests_per_trial, 8.0);
    assert_eq!(record.average_false_positive_rate, 0.0);
    assert_eq!(record.average_false_negative_rate, 0.0);
}

#[test]
fn test_default_run_is_plausible() {
    let sim = GroupTestSimulator::with_seed(SimulationParameters::default(), 8);
    let record = sim.run().unwrap();

    assert!(record.average_tests_per_trial >= 8.0);
    assert!(record.average_tests_per_trial <= 511.0);
    assert!(record.average_false_positive_rate > 0.0 && record.average_false_positive_rate < 1.0);
    assert!(record.average_false_negative_rate > 0.0 && record.average_false_negative_rate < 0.3);
}

#[test]
fn test_config_and_cli_pipeline() {
    let mut path = std::env::temp_dir();
    path.push(format!("grouptest_it_config_{}.toml", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();
    std::fs::write(
        &path,
        "[simulation]\ntrial_count = 20\nsample_count = 64\ninfected_rate = 0.0\nfalse_positive_rate = 0.0\nseed = 11\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["grouptest", "--config", path.as_str(), "-b", "8"]).unwrap();
    let cfg = AppConfig::load_or_default(&cli.config).unwrap();
    let (params, seed) = cli.resolve(&cfg.simulation);
    params.validate().unwrap();
    assert_eq!(seed, Some(11));

    let record = GroupTestSimulator::with_seed(params, 11).run().unwrap();
    assert_eq!(record.average_tests_per_trial, 8.0);
    assert_eq!(record.average_false_positive_rate, 0.0);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_invalid_cli_values_fail_validation() {
    let cli = Cli::try_parse_from(["grouptest", "-i", "1.5"]).unwrap();
    let (params, _) = cli.resolve(&AppConfig::default().simulation);
    assert!(matches!(
        params.validate(),
        Err(GroupTestError::InvalidParameter { name: "infected_rate", .. })
    ));

    let cli = Cli::try_parse_from(["grouptest", "-b", "0"]).unwrap();
    let (params, _) = cli.resolve(&AppConfig::default().simulation);
    assert!(params.validate().is_err());
}
