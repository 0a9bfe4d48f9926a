//! UI rendering module for vincli
//!
//! Every screen shares the same frame: a title bar, the view for the current
//! [`AppState`], a status line and a key hint line. The help overlay is drawn
//! on top when toggled.

pub mod batch;
pub mod compare;
pub mod help_overlay;
pub mod history;
pub mod main_menu;
pub mod prompt;
pub mod vehicle;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppState, BatchStep, CompareStep, HistoryStep, LookupStep, StatusKind};
use crate::data::FieldValue;

pub use help_overlay::render as render_help_overlay;

/// Renders the whole screen for the current state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(5),    // View
            Constraint::Length(1), // Status
            Constraint::Length(1), // Keys
        ])
        .split(frame.area());

    render_title(frame, chunks[0], title_for(app.state));

    match app.state {
        AppState::MainMenu | AppState::Exit => main_menu::render(frame, chunks[1]),
        AppState::Lookup(LookupStep::Input) => {
            prompt::render(frame, chunks[1], "Please enter VIN number", &app.input)
        }
        AppState::Lookup(LookupStep::Result) => vehicle::render(frame, app, chunks[1]),
        AppState::Batch(BatchStep::Input) => {
            prompt::render(frame, chunks[1], "Enter the path to the VIN file", &app.input)
        }
        AppState::Batch(BatchStep::Report) => batch::render(frame, app, chunks[1]),
        AppState::Compare(CompareStep::First) => {
            prompt::render(frame, chunks[1], "Enter first VIN", &app.input)
        }
        AppState::Compare(CompareStep::Second) => {
            let label = match &app.compare_first {
                Some(first) => format!("Enter second VIN (comparing with {})", first),
                None => "Enter second VIN".to_string(),
            };
            prompt::render(frame, chunks[1], &label, &app.input)
        }
        AppState::Compare(CompareStep::Result) => compare::render(frame, app, chunks[1]),
        AppState::History(_) => history::render(frame, app, chunks[1]),
    }

    render_status(frame, app, chunks[2]);
    render_keys(frame, chunks[3], key_hints(app));

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn title_for(state: AppState) -> &'static str {
    match state {
        AppState::MainMenu | AppState::Exit => "Main menu",
        AppState::Lookup(_) => "New lookup",
        AppState::Batch(_) => "Batch lookup",
        AppState::Compare(_) => "Compare VINs",
        AppState::History(_) => "Lookup history",
    }
}

fn render_title(frame: &mut Frame, area: Rect, title: &str) {
    let line = Line::from(vec![
        Span::styled(
            "VINCLI",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  \u{2502}  ", Style::default().fg(Color::DarkGray)),
        Span::styled(title.to_string(), Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Progress of a running job takes precedence over the last message
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(busy) = &app.busy {
        let mut spans = vec![Span::styled(busy.clone(), Style::default().fg(Color::Cyan))];
        if let Some(notice) = &app.retry_note {
            spans.push(Span::styled(
                format!(
                    "  attempt {} failed, retrying in {:.1}s",
                    notice.attempt,
                    notice.delay.as_secs_f64()
                ),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans.push(Span::styled("  (Esc to cancel)", Style::default().fg(Color::DarkGray)));
        Line::from(spans)
    } else if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Yellow,
            StatusKind::Success => Color::Green,
            StatusKind::Error => Color::Red,
        };
        Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(app: &App) -> &'static str {
    match app.state {
        AppState::MainMenu | AppState::Exit => "n lookup  b batch  c compare  h history  q quit  ? help",
        AppState::Lookup(LookupStep::Input)
        | AppState::Batch(BatchStep::Input)
        | AppState::Compare(CompareStep::First)
        | AppState::Compare(CompareStep::Second) => "Enter submit  Esc back",
        AppState::Lookup(LookupStep::Result) => {
            "t TXT  p PDF  x spreadsheet  j/k scroll  n new lookup  Esc menu"
        }
        AppState::Batch(BatchStep::Report) | AppState::Compare(CompareStep::Result) => {
            "t TXT  p PDF  x spreadsheet  j/k scroll  Esc menu"
        }
        AppState::History(HistoryStep::Browse) => {
            "j/k select  d delete  c clear  t/p/x export  r reload  Esc menu"
        }
        AppState::History(HistoryStep::ConfirmDelete) | AppState::History(HistoryStep::ConfirmClear) => {
            "y confirm  any other key cancels"
        }
    }
}

fn render_keys(frame: &mut Frame, area: Rect, hints: &str) {
    let paragraph = Paragraph::new(Span::styled(
        hints.to_string(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(paragraph, area);
}

/// Bordered block with a cyan title, as used by every view
pub(crate) fn panel(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

/// Value as shown in tables; absent and null both read `N/A`
pub(crate) fn display_value(value: Option<&FieldValue>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "N/A".to_string(),
    }
}
