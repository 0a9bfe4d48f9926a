//! Command-line interface parsing for vincli
//!
//! Flags override the matching settings-file values. `--lookup` and `--batch`
//! skip the main menu and start the corresponding flow right away.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::data::{InvalidVin, Vin};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The VIN given to `--lookup` is malformed
    #[error("Invalid VIN '{input}': {source}")]
    InvalidVin {
        input: String,
        #[source]
        source: InvalidVin,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// vincli - Look up, compare and export vehicle data by VIN
#[derive(Parser, Debug)]
#[command(name = "vincli")]
#[command(about = "Look up, compare and export vehicle data by VIN")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the per-user config.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lookup history file
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    /// Lookup endpoint; `{vin}` is replaced with the VIN
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory exports are written to
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Log file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Attempts per lookup, including the first
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,

    /// Look up this VIN immediately
    ///
    /// Example:
    ///   vincli --lookup 1M8GDM9AXKP042788
    #[arg(long, value_name = "VIN", conflicts_with = "batch")]
    pub lookup: Option<String>,

    /// Look up every VIN in FILE (one per line) immediately
    #[arg(long, value_name = "FILE")]
    pub batch: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Settings with CLI overrides applied
    pub settings: Settings,
    /// VIN to look up on start
    pub initial_lookup: Option<Vin>,
    /// VIN file to process on start
    pub initial_batch: Option<PathBuf>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments
    ///
    /// Loads the settings file named by `--config`, or the per-user one.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with overrides applied
    /// * `Err(CliError)` if the settings file is unusable or `--lookup` is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let settings = Settings::discover(cli.config.as_deref())?;
        Self::with_settings(cli, settings)
    }

    /// Applies the CLI overrides on top of already loaded settings
    pub fn with_settings(cli: &Cli, mut settings: Settings) -> Result<Self, CliError> {
        if let Some(path) = &cli.history_file {
            settings.history_file = path.clone();
        }
        if let Some(url) = &cli.api_url {
            settings.api_url = url.clone();
        }
        if let Some(dir) = &cli.export_dir {
            settings.export_dir = dir.clone();
        }
        if let Some(path) = &cli.log_file {
            settings.logging.file = path.clone();
        }
        if let Some(attempts) = cli.attempts {
            settings.retry.max_attempts = attempts;
        }
        settings.validate()?;

        let initial_lookup = cli
            .lookup
            .as_deref()
            .map(|raw| {
                Vin::parse(raw).map_err(|source| CliError::InvalidVin {
                    input: raw.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(StartupConfig {
            settings,
            initial_lookup,
            initial_batch: cli.batch.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup(args: &[&str]) -> Result<StartupConfig, CliError> {
        let cli = Cli::parse_from(args);
        StartupConfig::with_settings(&cli, Settings::default())
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["vincli"]);
        assert!(cli.lookup.is_none());
        assert!(cli.batch.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_startup_config_default_settings() {
        let config = startup(&["vincli"]).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.initial_lookup.is_none());
        assert!(config.initial_batch.is_none());
    }

    #[test]
    fn test_overrides_replace_settings() {
        let config = startup(&[
            "vincli",
            "--history-file",
            "/tmp/h.json",
            "--api-url",
            "http://localhost:9000/vin/{vin}",
            "--export-dir",
            "out",
            "--log-file",
            "debug.log",
            "--attempts",
            "5",
        ])
        .unwrap();

        assert_eq!(config.settings.history_file, PathBuf::from("/tmp/h.json"));
        assert_eq!(config.settings.api_url, "http://localhost:9000/vin/{vin}");
        assert_eq!(config.settings.export_dir, PathBuf::from("out"));
        assert_eq!(config.settings.logging.file, PathBuf::from("debug.log"));
        assert_eq!(config.settings.retry.max_attempts, 5);
    }

    #[test]
    fn test_lookup_is_normalized() {
        let config = startup(&["vincli", "--lookup", " 1m8gdm9axkp042788 "]).unwrap();
        assert_eq!(
            config.initial_lookup.map(|v| v.to_string()).as_deref(),
            Some("1M8GDM9AXKP042788")
        );
    }

    #[test]
    fn test_invalid_lookup_vin() {
        let err = startup(&["vincli", "--lookup", "1M8GDM9AXKPO42788"]).unwrap_err();
        assert!(matches!(
            err,
            CliError::InvalidVin {
                source: InvalidVin::ForbiddenCharacter('O'),
                ..
            }
        ));
        assert!(err.to_string().contains("Invalid VIN"));
    }

    #[test]
    fn test_zero_attempts_rejected_by_parser() {
        assert!(Cli::try_parse_from(["vincli", "--attempts", "0"]).is_err());
    }

    #[test]
    fn test_lookup_and_batch_conflict() {
        assert!(Cli::try_parse_from([
            "vincli",
            "--lookup",
            "1M8GDM9AXKP042788",
            "--batch",
            "vins.txt"
        ])
        .is_err());
    }

    #[test]
    fn test_empty_api_url_rejected() {
        let err = startup(&["vincli", "--api-url", " "]).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_batch_path_kept() {
        let config = startup(&["vincli", "--batch", "vins.txt"]).unwrap();
        assert_eq!(config.initial_batch, Some(PathBuf::from("vins.txt")));
    }
}
