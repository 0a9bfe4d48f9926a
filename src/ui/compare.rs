//! Side-by-side comparison; rows that differ are highlighted

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Row, Table},
    Frame,
};

use super::{display_value, panel};
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(comparison) = &app.comparison else {
        return;
    };

    let rows: Vec<Row> = comparison
        .rows()
        .iter()
        .skip(app.scroll)
        .map(|row| {
            let style = if row.differs() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                row.field.to_string(),
                display_value(row.first),
                display_value(row.second),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec![
        "Field".to_string(),
        comparison.first_vin.to_string(),
        comparison.second_vin.to_string(),
    ])
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let title = format!(
        " {} vs {} ({} differing) ",
        comparison.first_vin,
        comparison.second_vin,
        comparison.differing()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Percentage(40),
            Constraint::Percentage(40),
        ],
    )
    .header(header)
    .block(panel(title));

    frame.render_widget(table, area);
}
