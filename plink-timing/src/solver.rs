// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Search for the smallest pulse codes that a receiver can always decode.
//!
//! Codes are fixed one run length at a time. Each new code starts one above
//! the previous one and grows until the windows of all codes fixed so far are
//! collision-free. Earlier codes are never revisited, so every accepted code
//! is the smallest valid one given the codes before it.

use itertools::Itertools;
use log::{debug, info};

use crate::timing_error;
use crate::types::{
    Direction, DirectionTiming, RunLengthDistribution, SolverResult, TimingResult,
};
use crate::window::TimingQuery;

/// Converts a bit period in ns into Mbit/s.
const NS_TO_MBIT_PER_SEC: f64 = 1000.0;

/// Finds pulse codes for one direction of a link at a time.
///
/// Holds nothing but the run length distribution, so one solver can serve
/// any number of directions and callers.
#[derive(Clone, Debug, Default)]
pub struct TimingSolver {
    distribution: RunLengthDistribution,
}

impl TimingSolver {
    #[must_use]
    pub fn new(distribution: RunLengthDistribution) -> Self {
        Self { distribution }
    }

    #[must_use]
    pub fn distribution(&self) -> &RunLengthDistribution {
        &self.distribution
    }

    /// Find the minimal codes for run lengths `1..=max_run_length`.
    ///
    /// `max_run_length` must match the length of the solver's distribution.
    pub fn find_minimal_codes(
        &self,
        transmit_period_ns: f64,
        sample_period_ns: f64,
        pulse_jitter_ns: f64,
        max_run_length: usize,
    ) -> TimingResult<SolverResult> {
        let timing = DirectionTiming::new(transmit_period_ns, sample_period_ns, pulse_jitter_ns);
        timing.validate()?;

        if max_run_length == 0 {
            return timing_error!("Maximum run length must be at least 1");
        }
        if max_run_length != self.distribution.len() {
            return timing_error!(
                "Maximum run length {max_run_length} does not match the {} entries of the run length distribution",
                self.distribution.len()
            );
        }

        let mut pulse_codes: Vec<u64> = Vec::with_capacity(max_run_length);
        let mut windows = Vec::new();
        for run_length in 1..=max_run_length {
            let mut code = match pulse_codes.last() {
                Some(last) => next_code(run_length, *last)?,
                None => 1,
            };
            loop {
                pulse_codes.push(code);
                if let Some(accepted) = TimingQuery::new(timing, &pulse_codes).try_evaluate()? {
                    windows = accepted;
                    break;
                }
                pulse_codes.pop();
                code = next_code(run_length, code)?;
            }
            debug!("run length {run_length}: accepted code {code}");
        }

        let bitrate_per_length: Vec<f64> = pulse_codes
            .iter()
            .enumerate()
            .map(|(i, &code)| bitrate(transmit_period_ns, i + 1, code))
            .collect();

        let average_bitrate: f64 = self
            .distribution
            .probabilities()
            .iter()
            .zip(&bitrate_per_length)
            .map(|(p, rate)| p * rate)
            .sum();

        let sample_timings = windows.iter().map(|w| w.min_samples).collect();
        Ok(SolverResult {
            pulse_codes,
            sample_timings,
            windows,
            bitrate_per_length,
            average_bitrate,
        })
    }

    /// Solve one direction of a link and log a report of the result.
    pub fn find_config(
        &self,
        direction: Direction,
        timing: &DirectionTiming,
    ) -> TimingResult<SolverResult> {
        info!("** FINDING TIMING CONFIG FOR DIRECTION '{direction}' **");
        let result = self.find_minimal_codes(
            timing.transmit_period_ns,
            timing.sample_period_ns,
            timing.pulse_jitter_ns,
            self.distribution.len(),
        )?;

        info!(
            "Timing for transmit_period={:.3} ns ({:.2} MHz) and sample_period={:.3} ns ({:.2} MHz)",
            timing.transmit_period_ns,
            NS_TO_MBIT_PER_SEC / timing.transmit_period_ns,
            timing.sample_period_ns,
            NS_TO_MBIT_PER_SEC / timing.sample_period_ns,
        );
        for (i, window) in result.windows.iter().enumerate() {
            let bits = i + 1;
            info!(
                "    {window} identical samples -> {bits} bit{}",
                if bits == 1 { "" } else { "s" }
            );
        }

        info!("Bitrate vs. pulse length:");
        for (i, rate) in result.bitrate_per_length.iter().enumerate() {
            let expected = self.distribution.probability(i + 1).unwrap_or_default();
            info!(
                "    @{}: {rate:6.2} MBit/s  (expected {:2.0}%)",
                i + 1,
                100.0 * expected
            );
        }
        info!("    ==> {:6.2} MBit/s  (expected avg.)", result.average_bitrate);
        info!(
            "TRANSMIT TIMINGS: [{}]",
            result.pulse_codes.iter().join(", ")
        );
        info!(
            "SAMPLE TIMINGS: [{}]",
            result.sample_timings.iter().join(", ")
        );

        Ok(result)
    }
}

fn next_code(run_length: usize, code: u64) -> TimingResult<u64> {
    match code.checked_add(1) {
        Some(next) => Ok(next),
        None => timing_error!("No pulse code for run length {run_length} fits in 64 bits"),
    }
}

/// Mbit/s achieved sending only runs of `run_length` bits with `code`.
fn bitrate(transmit_period_ns: f64, run_length: usize, code: u64) -> f64 {
    (NS_TO_MBIT_PER_SEC / transmit_period_ns) * run_length as f64 / code as f64
}
