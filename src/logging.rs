//! Logging configuration and initialization
//!
//! The terminal belongs to the TUI, so log events go to a file. The subscriber
//! is installed as the default for the calling thread only, and stays active
//! for as long as the returned guard lives.

use std::ffi::OsString;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use tracing::error;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "vincli.log";

/// Size after which the log file is rotated at start-up
const MAX_LOG_BYTES: u64 = 1_000_000;

/// Number of rotated log files kept
const LOG_BACKUPS: u32 = 5;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Builds the subscriber and makes it the current thread's default.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Dropping the
    /// guard uninstalls the subscriber.
    pub fn init(&self) -> io::Result<DefaultGuard> {
        rotate_if_needed(&self.file, MAX_LOG_BYTES, LOG_BACKUPS)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        let writer = Mutex::new(file);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let guard = match self.format.as_str() {
            "json" => tracing::subscriber::set_default(
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(writer)
                    .finish(),
            ),
            _ => tracing::subscriber::set_default(
                fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(writer)
                    .finish(),
            ),
        };

        Ok(guard)
    }
}

/// Reports an error nothing else handled
///
/// The detail goes to the log only; `out` (stderr in the binary) gets a
/// generic line pointing at the log file.
pub fn report_fatal(log_file: &Path, err: &dyn Display, out: &mut impl Write) {
    error!(error = %err, "unrecoverable error");
    let _ = writeln!(
        out,
        "A critical error has occurred. Check {} for details.",
        log_file.display()
    );
}

fn backup_path(path: &Path, n: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Shifts `log` to `log.1`, `log.1` to `log.2` and so on once `log` exceeds
/// `max_bytes`. The oldest backup beyond `backups` is overwritten.
fn rotate_if_needed(path: &Path, max_bytes: u64, backups: u32) -> io::Result<()> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if size <= max_bytes || backups == 0 {
        return Ok(());
    }

    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))
}
