// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Settings gathered from every configuration source.
//!
//! Sources are merged in increasing priority:
//!  - the defaults below
//!  - `config.toml` next to this file
//!  - the file given by `--config`
//!  - environment variables prefixed with `MACSIM_`, e.g. `MACSIM_SEED=3`
//!  - command-line arguments

use std::path::{Path, PathBuf};

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use macsim_engine::types::SimError;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "MACSIM_";

#[derive(Debug, Parser, Serialize, Deserialize)]
#[command(about = "Fixed-point multiply-accumulate pipeline simulation")]
pub struct Settings {
    /// An extra TOML configuration file.
    #[arg(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// The YAML platform file describing the pipeline. Empty uses the
    /// built-in tree.
    #[arg(long)]
    pub platform: Option<String>,

    /// Seed for the random stimulus.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of dot products to run.
    #[arg(long)]
    pub num_dot_products: Option<usize>,

    /// Valid ticks in each dot product. Zero uses the accumulator's
    /// `num_summands`.
    #[arg(long)]
    pub dot_product_length: Option<u64>,

    /// Width of the random factors.
    #[arg(long)]
    pub operand_width: Option<u32>,

    /// Probability that a tick carries data.
    #[arg(long)]
    pub valid_probability: Option<f64>,

    /// Probability that a lane carries an extra summand.
    #[arg(long)]
    pub extra_probability: Option<f64>,

    /// Width of the extra summands.
    #[arg(long)]
    pub extra_width: Option<u32>,

    /// Probability that a lane's product is negated.
    #[arg(long)]
    pub negate_probability: Option<f64>,

    /// Enable logging to the console.
    #[arg(long)]
    pub stdout: Option<bool>,

    /// Level of log message to display.
    #[arg(long)]
    pub stdout_level: Option<String>,

    /// Set a regular expression for which entities should have logging level
    /// set to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long)]
    pub stdout_filter_regex: Option<String>,

    /// Write log messages to this file. Empty disables the file.
    #[arg(long)]
    pub log_file: Option<String>,

    /// Level of log message written to `--log-file`.
    #[arg(long)]
    pub log_file_level: Option<String>,

    /// Level of messages not emitted by an entity.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: None,
            platform: Some(String::new()),
            seed: Some(0),
            num_dot_products: Some(100),
            dot_product_length: Some(0),
            operand_width: Some(8),
            valid_probability: Some(0.9),
            extra_probability: Some(0.0),
            extra_width: Some(8),
            negate_probability: Some(0.0),
            stdout: Some(true),
            stdout_level: Some("Info".to_string()),
            stdout_filter_regex: Some(String::new()),
            log_file: Some(String::new()),
            log_file_level: Some("Trace".to_string()),
            log_level: Some("Warn".to_string()),
        }
    }
}

impl Settings {
    /// Merge every source, with the command line taking priority.
    pub fn parse_all_sources() -> Result<Self, SimError> {
        let cli = Settings::parse();
        let config = Settings::figment_to_config(cli.config.as_deref())?;
        Ok(Settings::clap_merge(config, cli))
    }

    fn static_conf_file_path() -> PathBuf {
        let mut conf_file = PathBuf::from(file!());
        conf_file.set_extension("toml");
        conf_file
    }

    /// Defaults, then the TOML files, then the environment.
    pub fn figment_to_config(extra_conf_file: Option<&Path>) -> Result<Self, SimError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(Settings::static_conf_file_path()));
        if let Some(conf_file) = extra_conf_file {
            if !conf_file.is_file() {
                return Err(SimError(format!("{} not found", conf_file.display())));
            }
            figment = figment.merge(Toml::file(conf_file));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| SimError(format!("invalid configuration: {e}")))
    }

    /// Replace each field given on the command line.
    #[must_use]
    pub fn clap_merge(mut config: Settings, cli: Settings) -> Settings {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if cli.$field.is_some() {
                        config.$field = cli.$field;
                    }
                )*
            };
        }
        merge!(
            config,
            platform,
            seed,
            num_dot_products,
            dot_product_length,
            operand_width,
            valid_probability,
            extra_probability,
            extra_width,
            negate_probability,
            stdout,
            stdout_level,
            stdout_filter_regex,
            log_file,
            log_file_level,
            log_level,
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_files() {
        let config = Settings::figment_to_config(None).unwrap();
        assert_eq!(config.seed, Some(0));
        assert_eq!(config.operand_width, Some(8));
    }

    #[test]
    fn command_line_wins() {
        let config = Settings::default();
        let cli = Settings::parse_from(["sim-mac", "--seed", "7", "--stdout-level", "Debug"]);
        let merged = Settings::clap_merge(config, cli);
        assert_eq!(merged.seed, Some(7));
        assert_eq!(merged.stdout_level.as_deref(), Some("Debug"));
        assert_eq!(merged.num_dot_products, Some(100));
    }

    #[test]
    fn missing_extra_file() {
        let err = Settings::figment_to_config(Some(Path::new("no/such/file.toml"))).unwrap_err();
        assert!(err.to_string().contains("no/such/file.toml not found"));
    }
}
