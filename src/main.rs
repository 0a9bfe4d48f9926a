//! vincli - Look up, compare and export vehicle data by VIN
//!
//! A terminal UI application that decodes VINs through a web API, keeps a
//! local lookup history that doubles as a cache and exports results to text,
//! PDF and spreadsheet files.

use std::backtrace::Backtrace;
use std::error::Error;
use std::io;
use std::panic;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};

use vincli::app::App;
use vincli::cache::HistoryStore;
use vincli::cli::{Cli, StartupConfig};
use vincli::data::LookupClient;
use vincli::logging::report_fatal;
use vincli::retry::RetryNotice;
use vincli::service::{JobOutcome, VinService};
use vincli::ui;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Sets up a panic hook that logs the panic and restores the terminal before
/// printing the panic message.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!(
            panic = %panic_info,
            backtrace = %Backtrace::force_capture(),
            "application panicked"
        );
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

fn is_press(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
}

/// Runs the UI until the user quits
///
/// While a job runs, terminal events are only checked for the abort keys and
/// retry notices are forwarded to the status line. An abort drops the job's
/// future, which also cancels any pending retry wait.
async fn run(
    terminal: &mut Tui,
    app: &mut App,
    service: &VinService<LookupClient>,
    notices: &mut mpsc::UnboundedReceiver<RetryNotice>,
) -> io::Result<()> {
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if let Some(job) = app.take_job() {
            terminal.draw(|f| ui::render(f, app))?;

            let work = service.run(job);
            tokio::pin!(work);

            let outcome = loop {
                tokio::select! {
                    outcome = &mut work => break outcome,
                    Some(notice) = notices.recv() => {
                        app.note_retry(notice);
                        terminal.draw(|f| ui::render(f, app))?;
                    }
                    event = events.next() => match event {
                        Some(Ok(Event::Key(key))) if is_press(&key) && App::is_abort_key(&key) => {
                            info!("job cancelled by user");
                            break JobOutcome::Cancelled;
                        }
                        Some(Ok(Event::Resize(_, _))) => {
                            terminal.draw(|f| ui::render(f, app))?;
                        }
                        Some(Err(e)) => return Err(e),
                        None => return Ok(()),
                        _ => {}
                    },
                    _ = tokio::signal::ctrl_c() => {
                        info!("job cancelled by interrupt");
                        break JobOutcome::Cancelled;
                    }
                }
            };

            // Notices from an aborted job must not leak into the next one
            while notices.try_recv().is_ok() {}
            app.apply(outcome);
            continue;
        }

        match events.next().await {
            Some(Ok(Event::Key(key))) if is_press(&key) => app.handle_key(key),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e),
            None => return Ok(()),
        }
    }
}

/// Sets up the terminal, runs the UI and restores the terminal
async fn start(config: &StartupConfig) -> Result<(), Box<dyn Error>> {
    let settings = &config.settings;
    let client = LookupClient::new(settings.api_url.clone(), settings.request_timeout())?;

    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let service = VinService::new(
        client,
        HistoryStore::new(&settings.history_file),
        settings.retry_policy(),
    )
    .with_export_dir(&settings.export_dir)
    .with_batch_concurrency(settings.batch_concurrency)
    .with_retry_notices(notice_tx);

    let mut app = App::with_startup_config(config);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &service, &mut notice_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(result?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Parse CLI arguments and settings before touching the terminal
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };
    let log_file = &config.settings.logging.file;

    let _log_guard = match config.settings.logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!(
                "A critical error has occurred. Could not open log file {}: {}",
                log_file.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), "application started");

    match start(&config).await {
        Ok(()) => {
            info!("application exited");
            println!("Exiting VIN CLI. Goodbye!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_fatal(log_file, &e, &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}
