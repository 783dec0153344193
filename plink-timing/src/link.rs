// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Combine both directions of a link into one configuration.
//!
//! Each side of the link needs the pulse codes it transmits with and the
//! sample timings it receives with. The master's register holds the
//! MASTER -> SLAVE transmit timings and the SLAVE -> MASTER sample timings,
//! the slave's register holds the other two.

use std::fmt;

use crate::solver::TimingSolver;
use crate::timing_error;
use crate::types::{
    Direction, DirectionTiming, MAX_REGISTER_VALUE, MAX_RUN_LENGTH, SolverResult, TimingError,
    TimingField, TimingResult, check_jitter, check_period,
};

/// Size of one side's timing register (80 bits).
pub const REGISTER_BYTES: usize = 2 * MAX_RUN_LENGTH;

/// Nominal clocks and jitter bounds of both ends of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkParameters {
    pub master_period_ns: f64,
    pub slave_period_ns: f64,
    pub m2s_pulse_jitter_ns: f64,
    pub s2m_pulse_jitter_ns: f64,

    /// Bits the master moves per clock cycle.
    pub master_parbits: u32,

    /// Bits the slave moves per clock cycle.
    pub slave_parbits: u32,
}

impl LinkParameters {
    #[must_use]
    pub fn new(
        master_period_ns: f64,
        slave_period_ns: f64,
        m2s_pulse_jitter_ns: f64,
        s2m_pulse_jitter_ns: f64,
    ) -> Self {
        Self {
            master_period_ns,
            slave_period_ns,
            m2s_pulse_jitter_ns,
            s2m_pulse_jitter_ns,
            master_parbits: 1,
            slave_parbits: 1,
        }
    }

    #[must_use]
    pub fn with_parbits(mut self, master_parbits: u32, slave_parbits: u32) -> Self {
        self.master_parbits = master_parbits;
        self.slave_parbits = slave_parbits;
        self
    }

    pub fn validate(&self) -> TimingResult<()> {
        check_period("Master clock period", self.master_period_ns)?;
        check_period("Slave clock period", self.slave_period_ns)?;
        check_jitter("Master->Slave pulse jitter", self.m2s_pulse_jitter_ns)?;
        check_jitter("Slave->Master pulse jitter", self.s2m_pulse_jitter_ns)?;
        if self.master_parbits == 0 {
            return timing_error!("Master parbits must be at least 1");
        }
        if self.slave_parbits == 0 {
            return timing_error!("Slave parbits must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn master_bit_period_ns(&self) -> f64 {
        self.master_period_ns / f64::from(self.master_parbits)
    }

    #[must_use]
    pub fn slave_bit_period_ns(&self) -> f64 {
        self.slave_period_ns / f64::from(self.slave_parbits)
    }

    /// Timing seen by the transmitter and receiver of `direction`.
    #[must_use]
    pub fn direction_timing(&self, direction: Direction) -> DirectionTiming {
        match direction {
            Direction::MasterToSlave => DirectionTiming::new(
                self.master_bit_period_ns(),
                self.slave_bit_period_ns(),
                self.m2s_pulse_jitter_ns,
            ),
            Direction::SlaveToMaster => DirectionTiming::new(
                self.slave_bit_period_ns(),
                self.master_bit_period_ns(),
                self.s2m_pulse_jitter_ns,
            ),
        }
    }
}

impl fmt::Display for LinkParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "** TIMING SPECIFICATION SUMMARY **")?;
        writeln!(
            f,
            "    Master clock: {:.3} ns ({:.2} MHz), {} bit(s) per cycle",
            self.master_period_ns,
            1000.0 / self.master_period_ns,
            self.master_parbits
        )?;
        writeln!(
            f,
            "    Slave clock: {:.3} ns ({:.2} MHz), {} bit(s) per cycle",
            self.slave_period_ns,
            1000.0 / self.slave_period_ns,
            self.slave_parbits
        )?;
        writeln!(
            f,
            "    Master->Slave pulse jitter: {:.3} ns",
            self.m2s_pulse_jitter_ns
        )?;
        write!(
            f,
            "    Slave->Master pulse jitter: {:.3} ns",
            self.s2m_pulse_jitter_ns
        )
    }
}

/// Solver results for both directions of a link.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    pub master_to_slave: SolverResult,
    pub slave_to_master: SolverResult,
}

impl LinkConfig {
    /// Solve both directions. The two searches are independent.
    pub fn solve(solver: &TimingSolver, params: &LinkParameters) -> TimingResult<Self> {
        params.validate()?;
        let master_to_slave = solver.find_config(
            Direction::MasterToSlave,
            &params.direction_timing(Direction::MasterToSlave),
        )?;
        let slave_to_master = solver.find_config(
            Direction::SlaveToMaster,
            &params.direction_timing(Direction::SlaveToMaster),
        )?;
        Ok(Self {
            master_to_slave,
            slave_to_master,
        })
    }

    #[must_use]
    pub fn result(&self, direction: Direction) -> &SolverResult {
        match direction {
            Direction::MasterToSlave => &self.master_to_slave,
            Direction::SlaveToMaster => &self.slave_to_master,
        }
    }

    /// Every transmit or sample timing that will not fit in its register
    /// field, in register order.
    #[must_use]
    pub fn out_of_range(&self) -> Vec<TimingError> {
        let mut errors = Vec::new();
        for direction in [Direction::MasterToSlave, Direction::SlaveToMaster] {
            let result = self.result(direction);
            for (i, &code) in result.pulse_codes.iter().enumerate() {
                let value = i128::from(code);
                if let Err(e) = to_register(direction, TimingField::TransmitTiming, i + 1, value) {
                    errors.push(e);
                }
            }
            for (i, &value) in result.sample_timings.iter().enumerate() {
                let value = i128::from(value);
                if let Err(e) = to_register(direction, TimingField::SampleTiming, i + 1, value) {
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Fail with the first value that does not fit in a register field.
    pub fn check_register_range(&self) -> TimingResult<()> {
        match self.out_of_range().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The master's register image, most significant byte first.
    pub fn master_timings(&self) -> TimingResult<[u8; REGISTER_BYTES]> {
        pack_register(
            (Direction::MasterToSlave, &self.master_to_slave),
            (Direction::SlaveToMaster, &self.slave_to_master),
        )
    }

    /// The slave's register image, most significant byte first.
    pub fn slave_timings(&self) -> TimingResult<[u8; REGISTER_BYTES]> {
        pack_register(
            (Direction::SlaveToMaster, &self.slave_to_master),
            (Direction::MasterToSlave, &self.master_to_slave),
        )
    }
}

fn to_register(
    direction: Direction,
    field: TimingField,
    run_length: usize,
    value: i128,
) -> TimingResult<u8> {
    if !(0..=i128::from(MAX_REGISTER_VALUE)).contains(&value) {
        return Err(TimingError::RangeOverflow {
            direction,
            field,
            run_length,
            value,
        });
    }
    Ok(value as u8)
}

/// Transmit timings for run lengths 5..1 followed by sample timings for 5..1.
fn pack_register(
    transmit: (Direction, &SolverResult),
    sample: (Direction, &SolverResult),
) -> TimingResult<[u8; REGISTER_BYTES]> {
    let (tx_direction, tx) = transmit;
    let (rx_direction, rx) = sample;
    if tx.pulse_codes.len() != MAX_RUN_LENGTH || rx.sample_timings.len() != MAX_RUN_LENGTH {
        return timing_error!(
            "Timing registers hold exactly {MAX_RUN_LENGTH} run lengths per direction"
        );
    }

    let mut register = [0; REGISTER_BYTES];
    for i in 0..MAX_RUN_LENGTH {
        let run_length = MAX_RUN_LENGTH - i;
        let code = i128::from(tx.pulse_codes[run_length - 1]);
        register[i] = to_register(tx_direction, TimingField::TransmitTiming, run_length, code)?;
        register[MAX_RUN_LENGTH + i] = to_register(
            rx_direction,
            TimingField::SampleTiming,
            run_length,
            i128::from(rx.sample_timings[run_length - 1]),
        )?;
    }
    Ok(register)
}
