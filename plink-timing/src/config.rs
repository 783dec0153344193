// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Settings for the `plink-timing` front-end.
//!
//! Values are layered, each source overriding the ones before it:
//!  1. [`Settings::default()`]
//!  2. `plink-timing.toml` in the current directory, if present
//!  3. the TOML file named by `--conf-file`
//!  4. `PLINK_*` environment variables
//!  5. command-line flags

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::link::LinkParameters;
use crate::timing_error;
use crate::types::{
    EMPIRICAL_RUN_LENGTH_DISTRIBUTION, RunLengthDistribution, TimingError, TimingResult,
};

/// Configuration file picked up from the current directory.
pub const DEFAULT_CONF_FILE: &str = "plink-timing.toml";

/// Prefix of environment variables that set [`Settings`] fields.
pub const ENV_PREFIX: &str = "PLINK_";

/// Command-line arguments and configuration file contents.
#[derive(Parser, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[command(about = "Find pulse codes and sample windows for both directions of a link")]
pub struct Settings {
    /// Master clock period in ns
    #[arg(long)]
    pub master_period_ns: Option<f64>,

    /// Slave clock period in ns
    #[arg(long)]
    pub slave_period_ns: Option<f64>,

    /// Maximum pulse jitter from master to slave in ns
    #[arg(long)]
    pub m2s_pulse_jitter_ns: Option<f64>,

    /// Maximum pulse jitter from slave to master in ns
    #[arg(long)]
    pub s2m_pulse_jitter_ns: Option<f64>,

    /// Bits sent per master clock cycle
    #[arg(long)]
    pub master_parbits: Option<u32>,

    /// Bits sent per slave clock cycle
    #[arg(long)]
    pub slave_parbits: Option<u32>,

    /// Expected share of each run length, comma separated starting at 1 bit
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub run_length_distribution: Option<Vec<f64>>,

    /// Logging level
    #[arg(long)]
    pub log: Option<String>,

    /// Path to additional configuration file
    ///
    /// This file must contain TOML and may set any field of these settings.
    #[arg(long)]
    pub conf_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_period_ns: Some(6.0),
            slave_period_ns: Some(19.0),
            m2s_pulse_jitter_ns: Some(0.25),
            s2m_pulse_jitter_ns: Some(1.5),
            master_parbits: Some(1),
            slave_parbits: Some(1),
            run_length_distribution: Some(EMPIRICAL_RUN_LENGTH_DISTRIBUTION.to_vec()),
            log: Some("info".to_string()),
            conf_file: None,
        }
    }
}

impl Settings {
    /// Build settings from every source using the process arguments.
    pub fn parse_all_sources() -> TimingResult<Self> {
        Self::parse_all_sources_from(std::env::args_os())
    }

    /// Build settings from every source using `args` as the command line.
    pub fn parse_all_sources_from<I, T>(args: I) -> TimingResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Self::try_parse_from(args)
            .map_err(|e| TimingError::Config(format!("Invalid arguments: {e}")))?;

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(DEFAULT_CONF_FILE));
        if let Some(conf_file) = &cli.conf_file {
            check_conf_file(conf_file)?;
            figment = figment.merge(Toml::file(conf_file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let mut config: Self = figment
            .extract()
            .map_err(|e| TimingError::Config(format!("Unable to load settings: {e}")))?;
        config.clap_merge(cli);
        Ok(config)
    }

    fn clap_merge(&mut self, cli: Self) {
        if cli.master_period_ns.is_some() {
            self.master_period_ns = cli.master_period_ns;
        }
        if cli.slave_period_ns.is_some() {
            self.slave_period_ns = cli.slave_period_ns;
        }
        if cli.m2s_pulse_jitter_ns.is_some() {
            self.m2s_pulse_jitter_ns = cli.m2s_pulse_jitter_ns;
        }
        if cli.s2m_pulse_jitter_ns.is_some() {
            self.s2m_pulse_jitter_ns = cli.s2m_pulse_jitter_ns;
        }
        if cli.master_parbits.is_some() {
            self.master_parbits = cli.master_parbits;
        }
        if cli.slave_parbits.is_some() {
            self.slave_parbits = cli.slave_parbits;
        }
        if cli.run_length_distribution.is_some() {
            self.run_length_distribution = cli.run_length_distribution;
        }
        if cli.log.is_some() {
            self.log = cli.log;
        }
        if cli.conf_file.is_some() {
            self.conf_file = cli.conf_file;
        }
    }

    /// The validated link parameters.
    pub fn link_parameters(&self) -> TimingResult<LinkParameters> {
        let params = LinkParameters::new(
            required("master_period_ns", self.master_period_ns)?,
            required("slave_period_ns", self.slave_period_ns)?,
            required("m2s_pulse_jitter_ns", self.m2s_pulse_jitter_ns)?,
            required("s2m_pulse_jitter_ns", self.s2m_pulse_jitter_ns)?,
        )
        .with_parbits(
            required("master_parbits", self.master_parbits)?,
            required("slave_parbits", self.slave_parbits)?,
        );
        params.validate()?;
        Ok(params)
    }

    /// The validated run length distribution.
    pub fn distribution(&self) -> TimingResult<RunLengthDistribution> {
        let probabilities = required(
            "run_length_distribution",
            self.run_length_distribution.clone(),
        )?;
        RunLengthDistribution::new(probabilities)
    }
}

fn required<T>(name: &str, value: Option<T>) -> TimingResult<T> {
    match value {
        Some(value) => Ok(value),
        None => timing_error!("No value set for {name}"),
    }
}

fn check_conf_file(conf_file: &Path) -> TimingResult<()> {
    if conf_file.is_dir() {
        return timing_error!("{} is not a file path", conf_file.display());
    }
    if !conf_file.exists() {
        return timing_error!("{} not found", conf_file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let mut config = Settings::default();
        let cli = Settings::try_parse_from([
            "plink-timing",
            "--master-period-ns",
            "7.5",
            "--run-length-distribution",
            "0.5,0.5",
        ])
        .unwrap();
        config.clap_merge(cli);

        assert_eq!(config.master_period_ns, Some(7.5));
        assert_eq!(config.slave_period_ns, Some(19.0));
        assert_eq!(config.run_length_distribution, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn default_link_parameters() {
        let params = Settings::default().link_parameters().unwrap();
        assert_eq!(params, LinkParameters::new(6.0, 19.0, 0.25, 1.5));
    }

    #[test]
    fn missing_value_is_config_error() {
        let config = Settings {
            slave_period_ns: None,
            ..Settings::default()
        };
        assert_eq!(
            config.link_parameters(),
            Err(TimingError::Config(
                "No value set for slave_period_ns".to_string()
            ))
        );
    }

    #[test]
    fn default_distribution_is_empirical() {
        assert_eq!(
            Settings::default().distribution().unwrap(),
            RunLengthDistribution::default()
        );
    }
}
