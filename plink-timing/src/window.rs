// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Receiver decode windows for a candidate set of pulse codes.
//!
//! A run of `n` identical bits is sent as a pulse lasting `pulse_codes[n-1]`
//! transmit periods. The pulse can be up to `pulse_jitter_ns` shorter or longer
//! than nominal, and the receiver only knows how many of its own sample ticks
//! saw the level unchanged. Each run length therefore maps to a window of
//! sample counts. The codes are usable only if every window starts strictly
//! after the previous one ends.

use log::trace;

use crate::timing_error;
use crate::types::{DirectionTiming, SampleWindow, TimingResult};

const MAX_SAMPLE_COUNT: f64 = i64::MAX as f64;
const MIN_SAMPLE_COUNT: f64 = i64::MIN as f64;

/// One evaluation request: a direction's timing and the codes to check.
#[derive(Clone, Copy, Debug)]
pub struct TimingQuery<'a> {
    pub timing: DirectionTiming,
    pub pulse_codes: &'a [u64],
}

impl<'a> TimingQuery<'a> {
    #[must_use]
    pub fn new(timing: DirectionTiming, pulse_codes: &'a [u64]) -> Self {
        Self {
            timing,
            pulse_codes,
        }
    }

    /// Compute the window of every run length in `pulse_codes`.
    ///
    /// Returns `None` as soon as one window collides with the previous one.
    /// Both bounds are truncated towards zero and the upper bound gains a
    /// flat +1.
    ///
    /// Fails if a bound is beyond the range of an `i64` sample count.
    pub fn try_evaluate(&self) -> TimingResult<Option<Vec<SampleWindow>>> {
        let DirectionTiming {
            transmit_period_ns,
            sample_period_ns,
            pulse_jitter_ns,
        } = self.timing;

        let mut windows = Vec::with_capacity(self.pulse_codes.len());
        let mut last_max_samples = 0;
        for (i, &code) in self.pulse_codes.iter().enumerate() {
            let run_length = i + 1;
            let pulse_ns = code as f64 * transmit_period_ns;
            let min_samples = sample_count(
                run_length,
                code,
                (pulse_ns - pulse_jitter_ns) / sample_period_ns,
            )?;
            let max_samples = sample_count(
                run_length,
                code,
                (pulse_ns + pulse_jitter_ns) / sample_period_ns + 1.0,
            )?;
            trace!(
                "code {code}: {min_samples:2} - {max_samples:2} identical samples -> {run_length} bit(s)"
            );

            if min_samples <= last_max_samples {
                trace!("collision with run length {i}");
                return Ok(None);
            }

            last_max_samples = max_samples;
            windows.push(SampleWindow {
                min_samples,
                max_samples,
            });
        }
        Ok(Some(windows))
    }

    /// As [`TimingQuery::try_evaluate`], treating an unrepresentable bound
    /// as a rejection.
    #[must_use]
    pub fn evaluate(&self) -> Option<Vec<SampleWindow>> {
        self.try_evaluate().ok().flatten()
    }
}

/// Truncate a window bound to a whole sample count.
fn sample_count(run_length: usize, code: u64, samples: f64) -> TimingResult<i64> {
    // i64::MAX rounds up to 2^63 as an f64
    if !(samples > MIN_SAMPLE_COUNT && samples < MAX_SAMPLE_COUNT) {
        return timing_error!(
            "Run length {run_length} with code {code} spans {samples:e} samples, \
             beyond the range of a sample counter"
        );
    }
    Ok(samples.trunc() as i64)
}

/// Evaluate `pulse_codes` for one direction without building a query first.
#[must_use]
pub fn evaluate(
    transmit_period_ns: f64,
    sample_period_ns: f64,
    pulse_jitter_ns: f64,
    pulse_codes: &[u64],
) -> Option<Vec<SampleWindow>> {
    let timing = DirectionTiming::new(transmit_period_ns, sample_period_ns, pulse_jitter_ns);
    TimingQuery::new(timing, pulse_codes).evaluate()
}
