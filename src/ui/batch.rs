//! Batch report: one row per VIN that was found, then the failures

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use super::{display_value, panel};
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(report) = &app.batch else {
        return;
    };

    let found = report.results.iter().map(|item| {
        Row::new(vec![
            Cell::from(item.vin.to_string()).style(Style::default().fg(Color::Magenta)),
            Cell::from(display_value(item.record.make())),
            Cell::from(display_value(item.record.model())),
            Cell::from(display_value(item.record.year())),
            Cell::from(item.source.label()).style(Style::default().fg(Color::Green)),
        ])
    });

    let failed = report.failures.iter().map(|failure| {
        Row::new(vec![
            Cell::from(failure.input.clone()).style(Style::default().fg(Color::Red)),
            Cell::from(failure.reason.clone()).style(Style::default().fg(Color::Red)),
            Cell::from(""),
            Cell::from(""),
            Cell::from("failed").style(Style::default().fg(Color::Red)),
        ])
    });

    let rows: Vec<Row> = found.chain(failed).skip(app.scroll).collect();

    let header = Row::new(vec!["VIN", "Make", "Model", "Year", "Source"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let title = format!(
        " Batch results: {} successful, {} failed ",
        report.results.len(),
        report.failures.len()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Min(12),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(panel(title));

    frame.render_widget(table, area);
}
