//! Batch lookups from a file of VINs
//!
//! The batch owns one in-memory copy of the history for its whole run: cache
//! hits are resolved against it, fresh results are appended to it in input
//! order and it is persisted once at the end. Misses are fetched with bounded
//! fan-out, but the report and the history keep the file's order.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use super::{Source, VinService};
use crate::cache::{HistoryEntry, HistoryError};
use crate::data::{LookupFailed, VehicleRecord, VehicleSource, Vin};

/// Errors that stop a batch before any lookup
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot read VIN file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no VINs found in {path}")]
    Empty { path: PathBuf },
}

/// A VIN that produced a record
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub vin: Vin,
    pub record: VehicleRecord,
    pub source: Source,
}

/// A line that did not produce a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// The line as written in the file (trimmed)
    pub input: String,
    pub reason: String,
}

/// Everything a batch run produced
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub failures: Vec<BatchFailure>,
    /// Set when the fresh results could not be saved
    pub save_error: Option<HistoryError>,
}

impl BatchReport {
    /// Successful results as (VIN, record) pairs, for exports
    pub fn pairs(&self) -> Vec<(Vin, VehicleRecord)> {
        self.results
            .iter()
            .map(|item| (item.vin.clone(), item.record.clone()))
            .collect()
    }

    /// How many results came from the network
    pub fn fetched(&self) -> usize {
        self.results
            .iter()
            .filter(|item| item.source == Source::Remote)
            .count()
    }
}

/// Non-blank, trimmed lines of a VIN file
pub fn read_vin_file(path: &Path) -> Result<Vec<String>, BatchError> {
    let content = fs::read_to_string(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(BatchError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(lines)
}

/// How one input line will be resolved
enum Plan {
    Invalid { input: String, reason: String },
    Cached { vin: Vin, record: VehicleRecord },
    Fetch { vin: Vin },
}

impl<S: VehicleSource> VinService<S> {
    /// Looks up every VIN listed in `path`, one per line
    ///
    /// # Returns
    /// * `Ok(BatchReport)` - per-line results and failures; a failed save is
    ///   reported in `save_error`, not as an error
    /// * `Err(BatchError)` - if the file is missing, unreadable or has no VINs
    pub async fn batch(&self, path: &Path) -> Result<BatchReport, BatchError> {
        let lines = read_vin_file(path)?;
        info!(path = %path.display(), count = lines.len(), "batch lookup started");

        let mut history = self.store.load();

        let plans: Vec<Plan> = lines
            .into_iter()
            .map(|input| match Vin::parse(&input) {
                Err(e) => {
                    warn!(%input, error = %e, "invalid VIN in batch");
                    Plan::Invalid {
                        input,
                        reason: e.to_string(),
                    }
                }
                Ok(vin) => match history.find_cached(&vin) {
                    Some(record) => Plan::Cached {
                        record: record.clone(),
                        vin,
                    },
                    None => Plan::Fetch { vin },
                },
            })
            .collect();

        let mut seen = HashSet::new();
        let misses: Vec<Vin> = plans
            .iter()
            .filter_map(|plan| match plan {
                Plan::Fetch { vin } if seen.insert(vin.clone()) => Some(vin.clone()),
                _ => None,
            })
            .collect();

        let fetched: HashMap<Vin, Result<VehicleRecord, LookupFailed>> = stream::iter(misses)
            .map(|vin| async move {
                let result = self.fetch_with_retry(&vin).await;
                (vin, result)
            })
            .buffered(self.batch_concurrency.max(1))
            .collect()
            .await;

        let mut report = BatchReport::default();
        let mut appended = HashSet::new();

        for plan in plans {
            match plan {
                Plan::Invalid { input, reason } => {
                    report.failures.push(BatchFailure { input, reason });
                }
                Plan::Cached { vin, record } => report.results.push(BatchItem {
                    vin,
                    record,
                    source: Source::Cache,
                }),
                Plan::Fetch { vin } => match fetched.get(&vin) {
                    Some(Ok(record)) => {
                        // A repeated VIN is served from the entry its first
                        // occurrence just added
                        let source = if appended.insert(vin.clone()) {
                            history.push(HistoryEntry::new(record.clone()));
                            Source::Remote
                        } else {
                            Source::Cache
                        };
                        report.results.push(BatchItem {
                            vin,
                            record: record.clone(),
                            source,
                        });
                    }
                    Some(Err(e)) => {
                        warn!(%vin, error = %e, "batch lookup failed");
                        report.failures.push(BatchFailure {
                            input: vin.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    None => report.failures.push(BatchFailure {
                        input: vin.to_string(),
                        reason: "lookup did not run".to_string(),
                    }),
                },
            }
        }

        if !appended.is_empty() {
            report.save_error = self.store.persist(&history).err();
        }

        info!(
            succeeded = report.results.len(),
            failed = report.failures.len(),
            fetched = appended.len(),
            "batch lookup complete"
        );
        Ok(report)
    }
}
