// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use plink_timing::link::{LinkConfig, LinkParameters};
use plink_timing::solver::TimingSolver;
use plink_timing::types::{DirectionTiming, MAX_RUN_LENGTH, RunLengthDistribution};

fn solve(transmit_period_ns: f64, sample_period_ns: f64, pulse_jitter_ns: f64) {
    TimingSolver::default()
        .find_minimal_codes(
            transmit_period_ns,
            sample_period_ns,
            pulse_jitter_ns,
            MAX_RUN_LENGTH,
        )
        .unwrap();
}

// Period and jitter errors

#[test]
#[should_panic(expected = "Transmit period must be a positive number of ns, got 0")]
fn zero_transmit_period() {
    solve(0.0, 19.0, 0.25);
}

#[test]
#[should_panic(expected = "Sample period must be a positive number of ns, got -19")]
fn negative_sample_period() {
    solve(6.0, -19.0, 0.25);
}

#[test]
#[should_panic(expected = "Sample period must be a positive number of ns, got NaN")]
fn nan_sample_period() {
    solve(6.0, f64::NAN, 0.25);
}

#[test]
#[should_panic(expected = "Pulse jitter must be a non-negative number of ns, got -0.25")]
fn negative_jitter() {
    solve(6.0, 19.0, -0.25);
}

#[test]
#[should_panic(expected = "Pulse jitter must be a non-negative number of ns, got inf")]
fn infinite_jitter() {
    solve(6.0, 19.0, f64::INFINITY);
}

#[test]
#[should_panic(expected = "Transmit period must be a positive number of ns")]
fn validate_direction_timing() {
    DirectionTiming::new(0.0, 1.0, 0.0).validate().unwrap();
}

#[test]
#[should_panic(
    expected = "Run length 1 with code 1 spans 1e19 samples, beyond the range of a sample counter"
)]
fn sample_count_overflow() {
    solve(1.0, 1e-19, 0.0);
}

// Run length errors

#[test]
#[should_panic(expected = "Maximum run length must be at least 1")]
fn zero_max_run_length() {
    TimingSolver::default()
        .find_minimal_codes(6.0, 19.0, 0.25, 0)
        .unwrap();
}

#[test]
#[should_panic(
    expected = "Maximum run length 4 does not match the 5 entries of the run length distribution"
)]
fn max_run_length_mismatch() {
    TimingSolver::default()
        .find_minimal_codes(6.0, 19.0, 0.25, 4)
        .unwrap();
}

// Distribution errors

#[test]
#[should_panic(expected = "Run length distribution is empty")]
fn empty_distribution() {
    RunLengthDistribution::new(Vec::new()).unwrap();
}

#[test]
#[should_panic(expected = "Probability 1.5 for run length 2 is outside [0, 1]")]
fn probability_too_large() {
    RunLengthDistribution::new(vec![0.0, 1.5, -0.5]).unwrap();
}

#[test]
#[should_panic(expected = "Run length distribution sums to 0.5, expected 1")]
fn distribution_does_not_sum_to_one() {
    RunLengthDistribution::new(vec![0.25, 0.25]).unwrap();
}

// Link errors

#[test]
#[should_panic(expected = "Master parbits must be at least 1")]
fn zero_master_parbits() {
    let params = LinkParameters::new(6.0, 19.0, 0.25, 1.5).with_parbits(0, 1);
    LinkConfig::solve(&TimingSolver::default(), &params).unwrap();
}

#[test]
#[should_panic(expected = "Slave->Master pulse jitter must be a non-negative number of ns")]
fn negative_link_jitter() {
    let params = LinkParameters::new(6.0, 19.0, 0.25, -1.5);
    LinkConfig::solve(&TimingSolver::default(), &params).unwrap();
}

#[test]
#[should_panic(expected = "Timing registers hold exactly 5 run lengths per direction")]
fn register_needs_five_run_lengths() {
    let distribution = RunLengthDistribution::new(vec![0.5, 0.5]).unwrap();
    let solver = TimingSolver::new(distribution);
    let link = LinkConfig::solve(&solver, &LinkParameters::new(6.0, 19.0, 0.25, 1.5)).unwrap();
    link.master_timings().unwrap();
}

#[test]
#[should_panic(
    expected = "Range overflow: MASTER -> SLAVE transmit timing for run length 5 is 1710, outside 0..=255"
)]
fn register_overflow() {
    // A 0.1ns bit period sampled at 19ns needs very long pulses
    let link = LinkConfig::solve(
        &TimingSolver::default(),
        &LinkParameters::new(0.1, 19.0, 0.0, 0.0),
    )
    .unwrap();
    if let Err(e) = link.master_timings() {
        panic!("{e}");
    }
}
