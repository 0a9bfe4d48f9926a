//! Application state management for vincli
//!
//! The menu flow is an explicit state machine. Keys move between states and
//! queue at most one [`Job`]; the event loop runs the job and feeds the
//! [`JobOutcome`] back through [`App::apply`]. Nothing here touches the
//! network or the disk, so every transition can be tested by calling
//! [`App::handle_key`] directly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::cache::{History, HistoryEntry};
use crate::cli::StartupConfig;
use crate::data::{VehicleRecord, Vin};
use crate::export::{ExportError, ExportFormat};
use crate::retry::RetryNotice;
use crate::service::{BatchReport, Comparison, ExportJob, Job, JobOutcome, Source};

/// Longest text accepted in an input prompt
const MAX_INPUT_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStep {
    /// Typing a VIN
    Input,
    /// Showing the looked-up record
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStep {
    /// Typing the path of a VIN file
    Input,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStep {
    First,
    Second,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Browse,
    /// Waiting for `y` to delete the selected entry
    ConfirmDelete,
    /// Waiting for `y` to delete everything
    ConfirmClear,
}

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    MainMenu,
    Lookup(LookupStep),
    Batch(BatchStep),
    Compare(CompareStep),
    History(HistoryStep),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// One line of feedback shown under the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// The record currently on the lookup result screen
#[derive(Debug, Clone, PartialEq)]
pub struct LookupView {
    pub vin: Vin,
    pub record: VehicleRecord,
    pub source: Source,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Text typed into the current prompt
    pub input: String,
    /// First VIN of a comparison, once entered
    pub compare_first: Option<Vin>,
    pub lookup: Option<LookupView>,
    pub batch: Option<BatchReport>,
    pub comparison: Option<Comparison>,
    /// History as last loaded
    pub history: History,
    /// Index (0-based) of the selected history row
    pub history_selected: usize,
    /// First visible row on result screens
    pub scroll: usize,
    pub status: Option<StatusMessage>,
    /// Description of the running job, if any
    pub busy: Option<String>,
    /// Latest retry wait of the running job
    pub retry_note: Option<RetryNotice>,
    /// Job queued by the last key, not yet picked up by the event loop
    pending: Option<Job>,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates a new App instance on the main menu
    pub fn new() -> Self {
        Self {
            state: AppState::MainMenu,
            input: String::new(),
            compare_first: None,
            lookup: None,
            batch: None,
            comparison: None,
            history: History::new(),
            history_selected: 0,
            scroll: 0,
            status: None,
            busy: None,
            retry_note: None,
            pending: None,
            show_help: false,
            should_quit: false,
        }
    }

    /// Creates a new App instance with the given startup configuration.
    ///
    /// `--lookup` and `--batch` open their flow with the job already queued.
    pub fn with_startup_config(config: &StartupConfig) -> Self {
        let mut app = Self::new();

        if let Some(vin) = &config.initial_lookup {
            app.state = AppState::Lookup(LookupStep::Input);
            app.input = vin.to_string();
            app.pending = Some(Job::Lookup(vin.clone()));
        } else if let Some(path) = &config.initial_batch {
            app.state = AppState::Batch(BatchStep::Input);
            app.input = path.display().to_string();
            app.pending = Some(Job::Batch(path.clone()));
        }

        app
    }

    /// True for the keys that abort a running job
    pub fn is_abort_key(key_event: &KeyEvent) -> bool {
        key_event.code == KeyCode::Esc || is_ctrl_c(key_event)
    }

    /// Hands the queued job to the event loop and marks the app busy
    pub fn take_job(&mut self) -> Option<Job> {
        let job = self.pending.take()?;
        self.busy = Some(job.describe());
        self.retry_note = None;
        Some(job)
    }

    /// Records a retry wait of the running job
    pub fn note_retry(&mut self, notice: RetryNotice) {
        self.retry_note = Some(notice);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// The history entry under the cursor
    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.history.entries().get(self.history_selected)
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind,
            text: text.into(),
        });
    }

    fn go_to(&mut self, state: AppState) {
        self.state = state;
        self.scroll = 0;
        if matches!(
            state,
            AppState::Lookup(LookupStep::Input)
                | AppState::Batch(BatchStep::Input)
                | AppState::Compare(CompareStep::First)
        ) {
            self.input.clear();
        }
    }

    fn quit(&mut self) {
        self.state = AppState::Exit;
        self.should_quit = true;
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `n`/`b`/`c`/`h` (main menu): lookup, batch, compare, history
    /// - `q`/`e` (main menu): Exit
    /// - `Enter` / `Backspace` / `Esc` in prompts: submit, delete, go back
    /// - `t`/`p`/`x` on result screens: export TXT / PDF / spreadsheet
    /// - `j`/`k`: scroll or move the history selection
    /// - `d`/`c` (history): delete selected / clear all, confirmed with `y`
    /// - `?`: Toggle help
    /// - `Ctrl-C`: Quit
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if is_ctrl_c(&key_event) {
            self.quit();
            return;
        }

        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(key_event.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        if key_event.code == KeyCode::Char('?') {
            self.show_help = true;
            return;
        }

        // Keys are ignored while a job runs; the event loop handles aborts
        if self.is_busy() || self.pending.is_some() {
            return;
        }

        match self.state {
            AppState::MainMenu => self.handle_main_menu(key_event),
            AppState::Lookup(LookupStep::Input)
            | AppState::Batch(BatchStep::Input)
            | AppState::Compare(CompareStep::First)
            | AppState::Compare(CompareStep::Second) => self.handle_input(key_event),
            AppState::Lookup(LookupStep::Result)
            | AppState::Batch(BatchStep::Report)
            | AppState::Compare(CompareStep::Result) => self.handle_result(key_event),
            AppState::History(step) => self.handle_history(step, key_event),
            AppState::Exit => {}
        }
    }

    fn handle_main_menu(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.status = None;
                self.go_to(AppState::Lookup(LookupStep::Input));
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                self.status = None;
                self.go_to(AppState::Batch(BatchStep::Input));
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.status = None;
                self.compare_first = None;
                self.go_to(AppState::Compare(CompareStep::First));
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.status = None;
                self.history_selected = 0;
                self.go_to(AppState::History(HistoryStep::Browse));
                self.pending = Some(Job::LoadHistory);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Char('e') | KeyCode::Char('E') => {
                self.quit();
            }
            KeyCode::Char(_) | KeyCode::Enter => {
                self.set_status(StatusKind::Error, "Invalid choice. Please try again.");
            }
            _ => {}
        }
    }

    fn handle_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char(c) => {
                if self.input.chars().count() < MAX_INPUT_LEN {
                    self.input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => match self.state {
                AppState::Compare(CompareStep::Second) => {
                    self.input = self
                        .compare_first
                        .take()
                        .map(|vin| vin.to_string())
                        .unwrap_or_default();
                    self.state = AppState::Compare(CompareStep::First);
                }
                _ => {
                    self.input.clear();
                    self.go_to(AppState::MainMenu);
                }
            },
            KeyCode::Enter => self.submit_input(),
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        if let AppState::Batch(BatchStep::Input) = self.state {
            let path = self.input.trim();
            if path.is_empty() {
                self.set_status(StatusKind::Error, "Enter the path to the VIN file.");
            } else {
                self.pending = Some(Job::Batch(path.into()));
            }
            return;
        }

        let vin = match Vin::parse(&self.input) {
            Ok(vin) => vin,
            Err(e) => {
                self.set_status(StatusKind::Error, format!("Invalid VIN: {}", e));
                return;
            }
        };
        self.status = None;

        match self.state {
            AppState::Lookup(LookupStep::Input) => {
                self.pending = Some(Job::Lookup(vin));
            }
            AppState::Compare(CompareStep::First) => {
                self.compare_first = Some(vin);
                self.input.clear();
                self.state = AppState::Compare(CompareStep::Second);
            }
            AppState::Compare(CompareStep::Second) => {
                if let Some(first) = self.compare_first.clone() {
                    self.pending = Some(Job::Compare(first, vin));
                }
            }
            _ => {}
        }
    }

    fn export_data(&self) -> Option<ExportJob> {
        match self.state {
            AppState::Lookup(LookupStep::Result) => self
                .lookup
                .as_ref()
                .map(|view| ExportJob::Vehicle(view.vin.clone(), view.record.clone())),
            AppState::Batch(BatchStep::Report) => {
                self.batch.as_ref().map(|report| ExportJob::Batch(report.pairs()))
            }
            AppState::Compare(CompareStep::Result) => {
                self.comparison.clone().map(ExportJob::Comparison)
            }
            AppState::History(_) => Some(ExportJob::History),
            _ => None,
        }
    }

    fn queue_export(&mut self, format: ExportFormat) {
        if let Some(data) = self.export_data() {
            self.pending = Some(Job::Export(data, format));
        }
    }

    /// Rows on the current result screen
    pub fn result_rows(&self) -> usize {
        match self.state {
            AppState::Lookup(LookupStep::Result) => self.lookup.as_ref().map_or(0, |v| v.record.len()),
            AppState::Batch(BatchStep::Report) => self
                .batch
                .as_ref()
                .map_or(0, |r| r.results.len() + r.failures.len()),
            AppState::Compare(CompareStep::Result) => {
                self.comparison.as_ref().map_or(0, |c| c.rows().len())
            }
            _ => 0,
        }
    }

    fn handle_result(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('t') => self.queue_export(ExportFormat::Text),
            KeyCode::Char('p') => self.queue_export(ExportFormat::Pdf),
            KeyCode::Char('x') => self.queue_export(ExportFormat::Spreadsheet),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.scroll + 1 < self.result_rows() {
                    self.scroll += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Char('n') if self.state == AppState::Lookup(LookupStep::Result) => {
                self.status = None;
                self.go_to(AppState::Lookup(LookupStep::Input));
            }
            KeyCode::Char('q') => self.quit(),
            KeyCode::Esc => {
                self.status = None;
                self.go_to(AppState::MainMenu);
            }
            _ => {}
        }
    }

    fn handle_history(&mut self, step: HistoryStep, key_event: KeyEvent) {
        match step {
            HistoryStep::Browse => match key_event.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    if self.history_selected + 1 < self.history.len() {
                        self.history_selected += 1;
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.history_selected = self.history_selected.saturating_sub(1);
                }
                KeyCode::Char('d') => {
                    if self.history.is_empty() {
                        self.set_status(StatusKind::Info, "No VIN history found.");
                    } else {
                        self.state = AppState::History(HistoryStep::ConfirmDelete);
                    }
                }
                KeyCode::Char('c') => {
                    if self.history.is_empty() {
                        self.set_status(StatusKind::Info, "No VIN history found.");
                    } else {
                        self.state = AppState::History(HistoryStep::ConfirmClear);
                    }
                }
                KeyCode::Char('r') => self.pending = Some(Job::LoadHistory),
                KeyCode::Char('t') => self.queue_export(ExportFormat::Text),
                KeyCode::Char('p') => self.queue_export(ExportFormat::Pdf),
                KeyCode::Char('x') => self.queue_export(ExportFormat::Spreadsheet),
                KeyCode::Char('q') => self.quit(),
                KeyCode::Esc => {
                    self.status = None;
                    self.go_to(AppState::MainMenu);
                }
                _ => {}
            },
            HistoryStep::ConfirmDelete => {
                self.state = AppState::History(HistoryStep::Browse);
                if key_event.code == KeyCode::Char('y') || key_event.code == KeyCode::Char('Y') {
                    self.pending = Some(Job::DeleteEntry(self.history_selected + 1));
                } else {
                    self.set_status(StatusKind::Info, "Deletion cancelled.");
                }
            }
            HistoryStep::ConfirmClear => {
                self.state = AppState::History(HistoryStep::Browse);
                if key_event.code == KeyCode::Char('y') || key_event.code == KeyCode::Char('Y') {
                    self.pending = Some(Job::ClearHistory);
                } else {
                    self.set_status(StatusKind::Info, "Clear cancelled.");
                }
            }
        }
    }

    fn replace_history(&mut self, history: History) {
        self.history = history;
        if self.history_selected >= self.history.len() {
            self.history_selected = self.history.len().saturating_sub(1);
        }
    }

    /// Updates the state with the result of the job that just ran
    pub fn apply(&mut self, outcome: JobOutcome) {
        self.busy = None;
        self.retry_note = None;

        match outcome {
            JobOutcome::LookedUp(Ok(lookup)) => {
                let message = match lookup.source {
                    Source::Cache => (StatusKind::Info, format!("Using cached data for VIN: {}", lookup.vin)),
                    Source::Remote => (StatusKind::Success, format!("Fetched data for VIN: {}", lookup.vin)),
                };
                match &lookup.save_error {
                    Some(e) => self.set_status(StatusKind::Error, format!("{}, but it was not saved: {}", message.1, e)),
                    None => self.set_status(message.0, message.1),
                }
                self.lookup = Some(LookupView {
                    vin: lookup.vin,
                    record: lookup.record,
                    source: lookup.source,
                });
                self.go_to(AppState::Lookup(LookupStep::Result));
            }
            JobOutcome::LookedUp(Err(e)) => {
                self.set_status(StatusKind::Error, format!("Error fetching VIN data: {}", e));
            }
            JobOutcome::Batched(Ok(report)) => {
                let mut text = format!(
                    "Batch lookup completed! {} successful, {} failed.",
                    report.results.len(),
                    report.failures.len()
                );
                let kind = match &report.save_error {
                    Some(e) => {
                        text.push_str(&format!(" History was not saved: {}", e));
                        StatusKind::Error
                    }
                    None => StatusKind::Success,
                };
                self.set_status(kind, text);
                self.batch = Some(report);
                self.go_to(AppState::Batch(BatchStep::Report));
            }
            JobOutcome::Batched(Err(e)) => {
                self.set_status(StatusKind::Error, e.to_string());
            }
            JobOutcome::Compared(Ok(compared)) => {
                let differing = compared.comparison.differing();
                match compared.save_errors.first() {
                    Some(e) => self.set_status(
                        StatusKind::Error,
                        format!("{} fields differ. History was not saved: {}", differing, e),
                    ),
                    None => self.set_status(StatusKind::Success, format!("{} fields differ.", differing)),
                }
                self.comparison = Some(compared.comparison);
                self.go_to(AppState::Compare(CompareStep::Result));
            }
            JobOutcome::Compared(Err(e)) => {
                self.set_status(StatusKind::Error, format!("Error fetching VIN data: {}", e));
            }
            JobOutcome::HistoryLoaded(history) => {
                if history.is_empty() {
                    self.set_status(StatusKind::Info, "No VIN history found.");
                }
                self.replace_history(history);
            }
            JobOutcome::Deleted { result, history } => {
                match result {
                    Ok(entry) => self.set_status(
                        StatusKind::Success,
                        format!("Deleted entry for VIN: {}", entry.vin.as_deref().unwrap_or("N/A")),
                    ),
                    Err(e) => self.set_status(StatusKind::Error, e.to_string()),
                }
                self.replace_history(history);
            }
            JobOutcome::Cleared { result, history } => {
                match result {
                    Ok(()) => self.set_status(StatusKind::Success, "All history cleared."),
                    Err(e) => self.set_status(StatusKind::Error, e.to_string()),
                }
                self.replace_history(history);
            }
            JobOutcome::Exported(Ok(path)) => {
                self.set_status(StatusKind::Success, format!("Exported to {}", path.display()));
            }
            JobOutcome::Exported(Err(ExportError::Empty)) => {
                self.set_status(StatusKind::Info, "Nothing to export.");
            }
            JobOutcome::Exported(Err(e)) => {
                self.set_status(StatusKind::Error, format!("Export failed: {}", e));
            }
            JobOutcome::Cancelled => {
                self.set_status(StatusKind::Info, "Cancelled.");
            }
        }
    }
}

fn is_ctrl_c(key_event: &KeyEvent) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
}
