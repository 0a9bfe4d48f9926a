//! Lookup orchestration
//!
//! [`VinService`] ties the pieces together: validated VIN, cache check,
//! retry-wrapped fetch, history append. The UI never calls these directly;
//! it hands out [`Job`] values and gets a [`JobOutcome`] back, so every error
//! kind reaches the state machine as data.

mod batch;
mod compare;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::cache::{History, HistoryEntry, HistoryError, HistoryStore};
use crate::data::{LookupFailed, VehicleRecord, VehicleSource, Vin};
use crate::export::{self, Document, ExportError, ExportFormat};
use crate::retry::{RetryNotice, RetryPolicy};

pub use batch::{read_vin_file, BatchError, BatchFailure, BatchItem, BatchReport};
pub use compare::{Comparison, ComparisonRow};

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from the lookup history
    Cache,
    /// Fetched from the API
    Remote,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Cache => "cached",
            Source::Remote => "API",
        }
    }
}

/// A successful single lookup
#[derive(Debug)]
pub struct Lookup {
    pub vin: Vin,
    pub record: VehicleRecord,
    pub source: Source,
    /// Set when a fresh record could not be saved; the record is still valid
    pub save_error: Option<HistoryError>,
}

/// A successful comparison
#[derive(Debug)]
pub struct Compared {
    pub comparison: Comparison,
    /// Saves that failed for either side
    pub save_errors: Vec<HistoryError>,
}

/// Data to export, owned so a job can outlive the screen that started it
#[derive(Debug, Clone)]
pub enum ExportJob {
    Vehicle(Vin, VehicleRecord),
    Batch(Vec<(Vin, VehicleRecord)>),
    Comparison(Comparison),
    /// The whole history as currently stored
    History,
}

/// Work requested by the UI
#[derive(Debug, Clone)]
pub enum Job {
    Lookup(Vin),
    Batch(PathBuf),
    Compare(Vin, Vin),
    LoadHistory,
    /// Delete the entry with this 1-based number
    DeleteEntry(usize),
    ClearHistory,
    Export(ExportJob, ExportFormat),
}

impl Job {
    /// Short progress text for the status line
    pub fn describe(&self) -> String {
        match self {
            Job::Lookup(vin) => format!("Looking up {}...", vin),
            Job::Batch(path) => format!("Processing VINs from {}...", path.display()),
            Job::Compare(a, b) => format!("Comparing {} and {}...", a, b),
            Job::LoadHistory => "Loading history...".to_string(),
            Job::DeleteEntry(index) => format!("Deleting entry #{}...", index),
            Job::ClearHistory => "Clearing history...".to_string(),
            Job::Export(_, format) => format!("Exporting {}...", format.label()),
        }
    }
}

/// Result of a [`Job`]
#[derive(Debug)]
pub enum JobOutcome {
    LookedUp(Result<Lookup, LookupFailed>),
    Batched(Result<BatchReport, BatchError>),
    Compared(Result<Compared, LookupFailed>),
    HistoryLoaded(History),
    /// Deletion result plus the history as it now stands
    Deleted {
        result: Result<HistoryEntry, HistoryError>,
        history: History,
    },
    Cleared {
        result: Result<(), HistoryError>,
        history: History,
    },
    Exported(Result<PathBuf, ExportError>),
    /// The user aborted the job before it finished
    Cancelled,
}

/// Cache-first VIN lookups backed by a [`VehicleSource`]
pub struct VinService<S> {
    source: S,
    store: HistoryStore,
    retry: RetryPolicy,
    export_dir: PathBuf,
    batch_concurrency: usize,
    notices: Option<UnboundedSender<RetryNotice>>,
}

impl<S: VehicleSource> VinService<S> {
    pub fn new(source: S, store: HistoryStore, retry: RetryPolicy) -> Self {
        Self {
            source,
            store,
            retry,
            export_dir: PathBuf::from("."),
            batch_concurrency: 1,
            notices: None,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// Forwards every retry wait to `sender` so the UI can show it
    pub fn with_retry_notices(mut self, sender: UnboundedSender<RetryNotice>) -> Self {
        self.notices = Some(sender);
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    async fn fetch_with_retry(&self, vin: &Vin) -> Result<VehicleRecord, LookupFailed> {
        let source = &self.source;
        let notices = self.notices.as_ref();
        self.retry
            .run_observed(
                || source.fetch(vin),
                |notice| {
                    if let Some(sender) = notices {
                        // The receiver is gone once the UI has shut down
                        let _ = sender.send(notice);
                    }
                },
            )
            .await
    }

    /// Looks up one VIN, preferring the history over the network
    ///
    /// A fresh record is appended to the history. Failing to save it does not
    /// fail the lookup; the error is returned in [`Lookup::save_error`].
    pub async fn lookup(&self, vin: &Vin) -> Result<Lookup, LookupFailed> {
        let mut history = self.store.load();
        self.lookup_in(&mut history, vin).await
    }

    /// One lookup against an already loaded history, which is kept in step
    /// with the file
    async fn lookup_in(&self, history: &mut History, vin: &Vin) -> Result<Lookup, LookupFailed> {
        if let Some(record) = history.find_cached(vin) {
            return Ok(Lookup {
                vin: vin.clone(),
                record: record.clone(),
                source: Source::Cache,
                save_error: None,
            });
        }

        info!(%vin, "looking up VIN");
        let record = match self.fetch_with_retry(vin).await {
            Ok(record) => record,
            Err(e) => {
                warn!(%vin, error = %e, "lookup failed");
                return Err(e);
            }
        };

        let save_error = self.store.append_to(history, record.clone()).err();
        Ok(Lookup {
            vin: vin.clone(),
            record,
            source: Source::Remote,
            save_error,
        })
    }

    /// Looks up both VINs and lines their fields up
    ///
    /// The history is read once for both lookups, so the second one sees the
    /// first one's result.
    pub async fn compare(&self, first: &Vin, second: &Vin) -> Result<Compared, LookupFailed> {
        let mut history = self.store.load();
        let a = self.lookup_in(&mut history, first).await?;
        let b = self.lookup_in(&mut history, second).await?;

        let save_errors = [a.save_error, b.save_error].into_iter().flatten().collect();
        let comparison = Comparison::new(a.vin, a.record, b.vin, b.record);
        info!(
            first = %comparison.first_vin,
            second = %comparison.second_vin,
            differing = comparison.differing(),
            "compared VINs"
        );

        Ok(Compared {
            comparison,
            save_errors,
        })
    }

    /// Writes `job`'s data to the export directory
    pub fn export(&self, job: &ExportJob, format: ExportFormat) -> Result<PathBuf, ExportError> {
        match job {
            ExportJob::Vehicle(vin, record) => {
                export::export(&Document::Vehicle { vin, record }, format, &self.export_dir)
            }
            ExportJob::Batch(results) => {
                export::export(&Document::Batch(results), format, &self.export_dir)
            }
            ExportJob::Comparison(comparison) => {
                export::export(&Document::Comparison(comparison), format, &self.export_dir)
            }
            ExportJob::History => {
                let history = self.store.load();
                export::export(&Document::History(&history), format, &self.export_dir)
            }
        }
    }

    /// Runs a job to completion
    ///
    /// Dropping the returned future aborts the job. The history file is only
    /// ever replaced whole, so it is left either untouched or fully updated.
    pub async fn run(&self, job: Job) -> JobOutcome {
        match job {
            Job::Lookup(vin) => JobOutcome::LookedUp(self.lookup(&vin).await),
            Job::Batch(path) => JobOutcome::Batched(self.batch(&path).await),
            Job::Compare(first, second) => JobOutcome::Compared(self.compare(&first, &second).await),
            Job::LoadHistory => JobOutcome::HistoryLoaded(self.store.load()),
            Job::DeleteEntry(index) => {
                let mut history = self.store.load();
                let result = self.store.delete_from(&mut history, index);
                JobOutcome::Deleted { result, history }
            }
            Job::ClearHistory => match self.store.clear() {
                Ok(()) => JobOutcome::Cleared {
                    result: Ok(()),
                    history: History::new(),
                },
                Err(e) => JobOutcome::Cleared {
                    result: Err(e),
                    history: self.store.load(),
                },
            },
            Job::Export(data, format) => JobOutcome::Exported(self.export(&data, format)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logging::test_support::capture_events;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    const FORD: &str = "1M8GDM9AXKP042788";
    const GOLF: &str = "WVWZZZ1JZXW000001";

    pub fn record_for(vin: &str, trim: &str) -> VehicleRecord {
        [("vin", vin), ("make", "Ford"), ("trim", trim)]
            .into_iter()
            .collect()
    }

    /// In-memory source that counts calls
    #[derive(Clone, Default)]
    pub struct StubSource {
        calls: Arc<AtomicUsize>,
        failing: Arc<HashSet<String>>,
        /// Calls that fail before any succeeds
        flaky: usize,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_failure(mut self, vin: &str) -> Self {
            let mut failing = (*self.failing).clone();
            failing.insert(vin.to_string());
            self.failing = Arc::new(failing);
            self
        }

        pub fn flaky(mut self, failures: usize) -> Self {
            self.flaky = failures;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl VehicleSource for StubSource {
        async fn fetch(&self, vin: &Vin) -> Result<VehicleRecord, LookupFailed> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.flaky || self.failing.contains(vin.as_str()) {
                return Err(LookupFailed {
                    status: Some(503),
                    body: "unavailable".to_string(),
                });
            }
            Ok(record_for(vin.as_str(), "fresh"))
        }
    }

    fn vin(s: &str) -> Vin {
        Vin::parse(s).unwrap()
    }

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            initial_delay: Duration::ZERO,
            backoff_factor: 2.0,
        }
    }

    fn service(temp_dir: &TempDir, source: StubSource) -> VinService<StubSource> {
        VinService::new(
            source,
            HistoryStore::new(temp_dir.path().join("history.json")),
            quick_retry(3),
        )
        .with_export_dir(temp_dir.path().join("exports"))
    }

    #[tokio::test]
    async fn test_lookup_fetches_then_serves_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let source = StubSource::new();
        let service = service(&temp_dir, source.clone());

        let first = service.lookup(&vin(FORD)).await.unwrap();
        assert_eq!(first.source, Source::Remote);
        assert!(first.save_error.is_none());

        let second = service.lookup(&vin(FORD)).await.unwrap();
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.record, first.record);

        assert_eq!(source.calls(), 1);
        assert_eq!(service.store().load().len(), 1, "cache hits are not re-saved");
    }

    #[tokio::test]
    async fn test_lookup_failure_after_retries_keeps_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = StubSource::new().with_failure(FORD);
        let service = service(&temp_dir, source.clone());

        let err = service.lookup(&vin(FORD)).await.unwrap_err();

        assert_eq!(err.status, Some(503));
        assert_eq!(source.calls(), 3);
        assert!(service.store().load().is_empty());
    }

    #[tokio::test]
    async fn test_retry_notices_are_forwarded() {
        let temp_dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = service(&temp_dir, StubSource::new().flaky(1)).with_retry_notices(tx);

        let lookup = service.lookup(&vin(FORD)).await.unwrap();

        assert_eq!(lookup.source, Source::Remote);
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.attempt, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lookup_save_failure_still_returns_record() {
        let temp_dir = TempDir::new().unwrap();
        let blocked = temp_dir.path().join("history.json");
        fs::create_dir(&blocked).unwrap();
        let service = VinService::new(StubSource::new(), HistoryStore::new(&blocked), quick_retry(1));

        let lookup = service.lookup(&vin(FORD)).await.unwrap();

        assert_eq!(lookup.record.vin(), Some(FORD));
        assert!(matches!(lookup.save_error, Some(HistoryError::Persist { .. })));
    }

    #[tokio::test]
    async fn test_compare_looks_up_both() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());

        let compared = service.compare(&vin(FORD), &vin(GOLF)).await.unwrap();

        assert_eq!(compared.comparison.first_vin.as_str(), FORD);
        assert_eq!(compared.comparison.second_vin.as_str(), GOLF);
        assert_eq!(compared.comparison.differing(), 1, "only the vin field differs");
        assert!(compared.save_errors.is_empty());
        assert_eq!(service.store().load().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_on_corrupted_history_logs_one_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());
        fs::write(service.store().path(), "{not valid json").unwrap();
        let (events, _guard) = capture_events();

        let lookup = service.lookup(&vin(FORD)).await.unwrap();

        assert_eq!(lookup.source, Source::Remote);
        assert_eq!(events.errors(), 1);
        assert_eq!(service.store().load().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_on_corrupted_history_logs_one_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());
        fs::write(service.store().path(), "{not valid json").unwrap();
        let (events, _guard) = capture_events();

        match service.run(Job::DeleteEntry(1)).await {
            JobOutcome::Deleted { result, history } => {
                assert!(matches!(
                    result,
                    Err(HistoryError::IndexOutOfRange { index: 1, len: 0 })
                ));
                assert!(history.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(events.errors(), 1);
    }

    #[tokio::test]
    async fn test_compare_same_vin_fetches_once() {
        let temp_dir = TempDir::new().unwrap();
        let source = StubSource::new();
        let service = service(&temp_dir, source.clone());

        let compared = service.compare(&vin(FORD), &vin(FORD)).await.unwrap();

        assert_eq!(compared.comparison.differing(), 0);
        assert_eq!(source.calls(), 1);
        assert_eq!(service.store().load().len(), 1);
    }

    #[tokio::test]
    async fn test_compare_fails_when_either_side_fails() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new().with_failure(GOLF));

        let err = service.compare(&vin(FORD), &vin(GOLF)).await.unwrap_err();
        assert_eq!(err.body, "unavailable");
    }

    #[tokio::test]
    async fn test_run_delete_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());
        service.store().append(record_for(FORD, "a")).unwrap();

        match service.run(Job::DeleteEntry(5)).await {
            JobOutcome::Deleted { result, history } => {
                assert!(matches!(
                    result,
                    Err(HistoryError::IndexOutOfRange { index: 5, len: 1 })
                ));
                assert_eq!(history.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_clear_returns_empty_history() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());
        service.store().append(record_for(FORD, "a")).unwrap();

        match service.run(Job::ClearHistory).await {
            JobOutcome::Cleared { result, history } => {
                assert!(result.is_ok());
                assert!(history.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_export_vehicle_and_empty_history() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir, StubSource::new());

        let job = ExportJob::Vehicle(vin(FORD), record_for(FORD, "a"));
        match service.run(Job::Export(job, ExportFormat::Text)).await {
            JobOutcome::Exported(Ok(path)) => {
                assert_eq!(path, temp_dir.path().join("exports").join(format!("{}_data.txt", FORD)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match service.run(Job::Export(ExportJob::History, ExportFormat::Pdf)).await {
            JobOutcome::Exported(Err(ExportError::Empty)) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_job_describe() {
        assert_eq!(Job::Lookup(vin(FORD)).describe(), format!("Looking up {}...", FORD));
        assert_eq!(Job::DeleteEntry(2).describe(), "Deleting entry #2...");
    }
}
