// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! Timing solver for a minimal-wire asynchronous serial link.
//!
//! The two ends of the link run from unrelated clocks. A run of `n` identical
//! bits is sent as a single pulse lasting a whole number of transmit periods
//! (its *pulse code*), and the receiver recovers `n` by counting how many of
//! its own sample ticks saw the level unchanged. This crate finds the
//! smallest pulse codes for which those counts can never be confused,
//! whatever the pulse jitter, and the sample count thresholds that go with
//! them.
//!
//! The [window](crate::window) module checks one candidate set of codes, the
//! [solver](crate::solver) searches for the minimal set and the
//! [link](crate::link) module combines both directions of a link into the
//! values programmed into each side's timing register.
//!
//! # Example
//!
//! ```rust
//! use plink_timing::link::{LinkConfig, LinkParameters};
//! use plink_timing::solver::TimingSolver;
//!
//! let solver = TimingSolver::default();
//! let params = LinkParameters::new(6.0, 19.0, 0.25, 1.5);
//! let link = LinkConfig::solve(&solver, &params)
//!     .expect("should be able to solve the link");
//! assert_eq!(link.master_to_slave.pulse_codes, vec![4, 10, 16, 23, 29]);
//! link.check_register_range()
//!     .expect("all values should fit in the timing registers");
//! ```

pub mod config;
pub mod link;
pub mod solver;
pub mod types;
pub mod window;
