// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

/// Run lengths the link protocol allows before the transmitter must toggle.
pub const MAX_RUN_LENGTH: usize = 5;

/// Largest value a timing register field can hold.
pub const MAX_REGISTER_VALUE: i64 = u8::MAX as i64;

/// Measured share of each run length (1 to 5 identical bits) in real traffic.
pub const EMPIRICAL_RUN_LENGTH_DISTRIBUTION: [f64; MAX_RUN_LENGTH] =
    [0.32735297, 0.36519647, 0.21898804, 0.07264801, 0.0158145];

/// Allowed distance of a distribution's total from 1.0.
const DISTRIBUTION_SUM_TOLERANCE: f64 = 1e-3;

// Timing errors

#[macro_export]
/// Build a [TimingError::Config] from a format string and its arguments
macro_rules! timing_error {
    ($($arg:tt)+) => {
        Err($crate::types::TimingError::Config(format!($($arg)+)))
    };
}

/// The two directions of communication over the link.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    MasterToSlave,
    SlaveToMaster,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::MasterToSlave => {
                write!(f, "MASTER -> SLAVE")
            }
            Direction::SlaveToMaster => {
                write!(f, "SLAVE -> MASTER")
            }
        }
    }
}

/// Which half of a [`SolverResult`] a register value came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimingField {
    TransmitTiming,
    SampleTiming,
}

impl fmt::Display for TimingField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimingField::TransmitTiming => {
                write!(f, "transmit timing")
            }
            TimingField::SampleTiming => {
                write!(f, "sample timing")
            }
        }
    }
}

/// The `TimingError` is returned by any operation that cannot produce a
/// usable timing configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum TimingError {
    /// Malformed input: bad period, jitter, distribution or run length count.
    Config(String),

    /// A computed value does not fit in an 8-bit configuration register.
    RangeOverflow {
        direction: Direction,
        field: TimingField,
        run_length: usize,
        value: i128,
    },
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimingError::Config(msg) => {
                write!(f, "Configuration error: {msg}")
            }
            TimingError::RangeOverflow {
                direction,
                field,
                run_length,
                value,
            } => {
                write!(
                    f,
                    "Range overflow: {direction} {field} for run length {run_length} is {value}, \
                     outside 0..={MAX_REGISTER_VALUE}"
                )
            }
        }
    }
}

impl Error for TimingError {}

pub type TimingResult<T> = Result<T, TimingError>;

/// Check a value is a usable clock or bit period.
pub(crate) fn check_period(name: &str, period_ns: f64) -> TimingResult<()> {
    if !period_ns.is_finite() || period_ns <= 0.0 {
        return timing_error!("{name} must be a positive number of ns, got {period_ns}");
    }
    Ok(())
}

/// Check a value is a usable pulse jitter bound.
pub(crate) fn check_jitter(name: &str, jitter_ns: f64) -> TimingResult<()> {
    if !jitter_ns.is_finite() || jitter_ns < 0.0 {
        return timing_error!("{name} must be a non-negative number of ns, got {jitter_ns}");
    }
    Ok(())
}

/// Expected frequency of each run length, indexed from run length 1.
#[derive(Clone, Debug, PartialEq)]
pub struct RunLengthDistribution {
    probabilities: Vec<f64>,
}

impl RunLengthDistribution {
    pub fn new(probabilities: Vec<f64>) -> TimingResult<Self> {
        if probabilities.is_empty() {
            return timing_error!("Run length distribution is empty");
        }

        for (i, p) in probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                return timing_error!(
                    "Probability {p} for run length {} is outside [0, 1]",
                    i + 1
                );
            }
        }

        let total: f64 = probabilities.iter().sum();
        if (total - 1.0).abs() > DISTRIBUTION_SUM_TOLERANCE {
            return timing_error!("Run length distribution sums to {total}, expected 1");
        }

        Ok(Self { probabilities })
    }

    /// Number of run lengths covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Probability of `run_length` (1-based), if covered.
    #[must_use]
    pub fn probability(&self, run_length: usize) -> Option<f64> {
        run_length
            .checked_sub(1)
            .and_then(|i| self.probabilities.get(i))
            .copied()
    }

    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl Default for RunLengthDistribution {
    fn default() -> Self {
        Self {
            probabilities: EMPIRICAL_RUN_LENGTH_DISTRIBUTION.to_vec(),
        }
    }
}

/// Periods and jitter bound for one direction of the link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionTiming {
    /// Nominal period of one transmitted bit.
    pub transmit_period_ns: f64,

    /// Period of the receiver's sample clock.
    pub sample_period_ns: f64,

    /// Worst-case deviation of a transmitted pulse from its nominal length.
    pub pulse_jitter_ns: f64,
}

impl DirectionTiming {
    #[must_use]
    pub fn new(transmit_period_ns: f64, sample_period_ns: f64, pulse_jitter_ns: f64) -> Self {
        Self {
            transmit_period_ns,
            sample_period_ns,
            pulse_jitter_ns,
        }
    }

    pub fn validate(&self) -> TimingResult<()> {
        check_period("Transmit period", self.transmit_period_ns)?;
        check_period("Sample period", self.sample_period_ns)?;
        check_jitter("Pulse jitter", self.pulse_jitter_ns)
    }
}

/// Range of receiver sample counts that decode as one run length.
///
/// `min_samples` is inclusive and `max_samples` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    pub min_samples: i64,
    pub max_samples: i64,
}

impl fmt::Display for SampleWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:2} - {:2}", self.min_samples, self.max_samples)
    }
}

/// The timing configuration found for one direction.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverResult {
    /// Transmit periods used to send each run length ("transmit timings").
    pub pulse_codes: Vec<u64>,

    /// Lower bound of each run length's window ("sample timings").
    pub sample_timings: Vec<i64>,

    /// Full decode window of each run length.
    pub windows: Vec<SampleWindow>,

    /// Mbit/s achieved when only sending runs of each length.
    pub bitrate_per_length: Vec<f64>,

    /// Expected Mbit/s under the run length distribution.
    pub average_bitrate: f64,
}

impl SolverResult {
    /// Run length a receiver programmed with `sample_timings` reports after
    /// counting `sample_count` identical samples.
    ///
    /// Returns `None` for a count below the first window.
    #[must_use]
    pub fn classify(&self, sample_count: i64) -> Option<usize> {
        self.sample_timings
            .iter()
            .rposition(|&min_samples| min_samples <= sample_count)
            .map(|i| i + 1)
    }
}
