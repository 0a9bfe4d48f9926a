//! Application settings
//!
//! Settings are resolved in layers: built-in defaults, then an optional TOML
//! file, then command-line overrides (applied by [`crate::cli::StartupConfig`]).
//!
//! ```toml
//! api_url = "https://db.vin/api/v1/vin/{vin}"
//! history_file = "autolookup_history.json"
//! export_dir = "exports"
//! request_timeout_secs = 15
//! batch_concurrency = 4
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 2000
//! backoff_factor = 2.0
//!
//! [logging]
//! file = "vincli.log"
//! level = "info"
//! format = "pretty"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_HISTORY_FILE;
use crate::data::DEFAULT_API_URL;
use crate::logging::LoggingConfig;
use crate::retry::{RetryConfig, RetryPolicy};

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read
    #[error("failed to read settings file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`]
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting has an unusable value
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Resolved application settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lookup endpoint; `{vin}` is replaced with the VIN
    pub api_url: String,
    /// History file, relative to the working directory unless absolute
    pub history_file: PathBuf,
    /// Directory exports are written to
    pub export_dir: PathBuf,
    /// Upper bound for a single lookup request
    pub request_timeout_secs: u64,
    /// Lookups in flight at once during a batch
    pub batch_concurrency: usize,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            export_dir: PathBuf::from("."),
            request_timeout_secs: 15,
            batch_concurrency: 4,
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text; missing keys keep their defaults
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Loads the explicitly given file, else the per-user settings file if it
    /// exists, else the defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.config/vincli/config.toml` on Linux, or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "vincli")?;
        Some(project_dirs.config_dir().join("config.toml"))
    }

    /// Checks values that would make lookups impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.backoff_factor",
                reason: "must be a finite number of at least 1.0".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "https://db.vin/api/v1/vin/{vin}");
        assert_eq!(settings.history_file, PathBuf::from("autolookup_history.json"));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.initial_delay_ms, 2000);
        assert!((settings.retry.backoff_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.request_timeout(), Duration::from_secs(15));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(Settings::parse_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_keys() {
        let settings = Settings::parse_toml(
            r#"
            export_dir = "out"

            [retry]
            max_attempts = 5

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.export_dir, PathBuf::from("out"));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_delay_ms, 2000);
        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Settings::parse_toml("retry = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = Settings::parse_toml("[retry]\nmax_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("retry.max_attempts"));
    }

    #[test]
    fn test_shrinking_backoff_rejected() {
        let err = Settings::parse_toml("[retry]\nbackoff_factor = 0.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "retry.backoff_factor",
                ..
            }
        ));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = Settings::discover(Some(temp_dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "batch_concurrency = 8\n").unwrap();

        let settings = Settings::discover(Some(path.as_path())).unwrap();
        assert_eq!(settings.batch_concurrency, 8);
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = Settings::parse_toml("[retry]\ninitial_delay_ms = 250").unwrap();
        let policy = settings.retry_policy();
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 3);
    }
}
