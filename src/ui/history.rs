//! History screen
//!
//! The table of past lookups on the left, every field of the selected entry on
//! the right. Delete and clear confirmations replace the detail panel.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use super::vehicle::{field_header, field_rows};
use super::{display_value, panel};
use crate::app::{App, AppState, HistoryStep};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_table(frame, app, chunks[0]);

    match app.state {
        AppState::History(HistoryStep::ConfirmDelete) => {
            let vin = app
                .selected_entry()
                .and_then(|entry| entry.vin.clone())
                .unwrap_or_else(|| "N/A".to_string());
            render_confirm(
                frame,
                chunks[1],
                format!("Delete entry #{} ({})?", app.history_selected + 1, vin),
            );
        }
        AppState::History(HistoryStep::ConfirmClear) => {
            render_confirm(
                frame,
                chunks[1],
                format!("Delete all {} history entries? This cannot be undone.", app.history.len()),
            );
        }
        _ => render_detail(frame, app, chunks[1]),
    }
}

/// Visible slice of rows that keeps the selection on screen
fn visible_range(selected: usize, total: usize, height: usize) -> (usize, usize) {
    if height == 0 || total <= height {
        return (0, total);
    }
    let start = selected.saturating_sub(height - 1);
    (start, (start + height).min(total))
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    // Borders and header take three lines
    let height = area.height.saturating_sub(3) as usize;
    let (start, end) = visible_range(app.history_selected, app.history.len(), height);

    let rows: Vec<Row> = app.history.entries()[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let index = start + offset;
            let style = if index == app.history_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from((index + 1).to_string()),
                Cell::from(entry.vin.clone().unwrap_or_else(|| "N/A".to_string()))
                    .style(Style::default().fg(Color::Magenta)),
                Cell::from(display_value(entry.data.make())),
                Cell::from(display_value(entry.data.model())),
                Cell::from(display_value(entry.data.year())),
                Cell::from(entry.display_timestamp()).style(Style::default().fg(Color::Yellow)),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec!["No.", "VIN", "Make", "Model", "Year", "Date & Time"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Min(8),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(19),
        ],
    )
    .header(header)
    .block(panel(" VIN Lookup History ".to_string()));

    frame.render_widget(table, area);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(entry) = app.selected_entry() else {
        let paragraph = Paragraph::new(Span::styled(
            "No VIN history found.",
            Style::default().fg(Color::Yellow),
        ))
        .block(panel(" Details ".to_string()));
        frame.render_widget(paragraph, area);
        return;
    };

    let table = Table::new(
        field_rows(&entry.data, 0),
        [Constraint::Percentage(45), Constraint::Percentage(55)],
    )
    .header(field_header())
    .block(panel(format!(" Entry #{} ", app.history_selected + 1)));

    frame.render_widget(table, area);
}

fn render_confirm(frame: &mut Frame, area: Rect, question: String) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            question,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to confirm, any other key to cancel"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(panel(" Confirm ".to_string()))
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{History, HistoryEntry};
    use crate::data::VehicleRecord;
    use crate::ui::test_support::screen_text;

    fn app_with_history() -> App {
        let mut app = App::new();
        app.state = AppState::History(HistoryStep::Browse);
        app.history = History::from(vec![
            HistoryEntry {
                timestamp: "2025-06-01T14:30:00".to_string(),
                vin: Some("1M8GDM9AXKP042788".to_string()),
                data: [("vin", "1M8GDM9AXKP042788"), ("brand", "Ford"), ("model", "F-150")]
                    .into_iter()
                    .collect(),
            },
            HistoryEntry {
                timestamp: "not a date".to_string(),
                vin: None,
                data: VehicleRecord::new(),
            },
        ]);
        app
    }

    #[test]
    fn test_visible_range_follows_selection() {
        assert_eq!(visible_range(0, 3, 10), (0, 3));
        assert_eq!(visible_range(0, 30, 10), (0, 10));
        assert_eq!(visible_range(15, 30, 10), (6, 16));
        assert_eq!(visible_range(29, 30, 10), (20, 30));
    }

    #[test]
    fn test_table_and_detail_are_rendered() {
        let content = screen_text(&app_with_history(), 140, 24);
        assert!(content.contains("VIN Lookup History"));
        assert!(content.contains("1M8GDM9AXKP042788"));
        assert!(content.contains("2025-06-01 14:30:00"));
        assert!(content.contains("not a date"));
        assert!(content.contains("Entry #1"));
        assert!(content.contains("brand"));
    }

    #[test]
    fn test_confirm_delete_is_rendered() {
        let mut app = app_with_history();
        app.state = AppState::History(HistoryStep::ConfirmDelete);
        let content = screen_text(&app, 140, 24);
        assert!(content.contains("Delete entry #1"));
        assert!(content.contains("to confirm"));
    }

    #[test]
    fn test_empty_history_message() {
        let mut app = App::new();
        app.state = AppState::History(HistoryStep::Browse);
        let content = screen_text(&app, 120, 24);
        assert!(content.contains("No VIN history found."));
    }
}
