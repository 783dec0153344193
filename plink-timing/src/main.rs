// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Command-line front-end which solves both directions of a link and prints
//! the register values for each side.
//!
//! For example, run using:
//!   cargo run --bin plink-timing -- --master-period-ns 6 --slave-period-ns 19
//!   --m2s-pulse-jitter-ns 0.25 --s2m-pulse-jitter-ns 1.5

use std::str::FromStr;

use anyhow::Result;
use itertools::Itertools;
use log::{LevelFilter, error};
use plink_timing::config::Settings;
use plink_timing::link::{LinkConfig, REGISTER_BYTES};
use plink_timing::solver::TimingSolver;
use simplelog::{ConfigBuilder, SimpleLogger};

/// Take the configured string and convert it to a level.
fn choose_level(lvl: &str) -> LevelFilter {
    match LevelFilter::from_str(lvl) {
        Ok(level) => level,
        Err(_) => {
            let default = LevelFilter::Error;
            println!("Unable to parse level string '{lvl}', defaulting to {default}");
            default
        }
    }
}

fn setup_logger(lvl: &str) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    SimpleLogger::init(choose_level(lvl), config)?;
    Ok(())
}

fn register_hex(register: &[u8; REGISTER_BYTES]) -> String {
    format!(
        "{}'h{}",
        REGISTER_BYTES * 8,
        register.iter().map(|b| format!("{b:02x}")).join("")
    )
}

fn main() -> Result<()> {
    let settings = Settings::parse_all_sources()?;
    setup_logger(settings.log.as_deref().unwrap_or("info"))?;

    let params = settings.link_parameters()?;
    let solver = TimingSolver::new(settings.distribution()?);

    println!("{params}");
    println!();

    let link = LinkConfig::solve(&solver, &params)?;

    let overflows = link.out_of_range();
    if !overflows.is_empty() {
        for overflow in &overflows {
            error!("{overflow}");
        }
        anyhow::bail!(
            "{} timing value(s) do not fit in the timing registers",
            overflows.len()
        );
    }

    println!("** CORE CONFIGURATION **");
    println!("MASTER_TIMINGS: {}", register_hex(&link.master_timings()?));
    println!("SLAVE_TIMINGS:  {}", register_hex(&link.slave_timings()?));
    println!(
        "Expected bitrate: {:.2} MBit/s master -> slave, {:.2} MBit/s slave -> master",
        link.master_to_slave.average_bitrate, link.slave_to_master.average_bitrate
    );

    Ok(())
}
