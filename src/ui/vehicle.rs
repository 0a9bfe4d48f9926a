//! Lookup result: every field of one vehicle record

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use super::{display_value, panel};
use crate::app::App;
use crate::data::VehicleRecord;

/// Field/value rows starting at `skip`
pub(crate) fn field_rows(record: &VehicleRecord, skip: usize) -> Vec<Row<'static>> {
    record
        .iter()
        .skip(skip)
        .map(|(field, value)| {
            Row::new(vec![
                Cell::from(field.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(display_value(Some(value))).style(Style::default().fg(Color::Magenta)),
            ])
        })
        .collect()
}

pub(crate) fn field_header() -> Row<'static> {
    Row::new(vec!["Field", "Value"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = &app.lookup else {
        return;
    };

    let title = format!(" VIN Data for {} ({}) ", view.vin, view.source.label());
    let table = Table::new(
        field_rows(&view.record, app.scroll),
        [Constraint::Length(28), Constraint::Min(10)],
    )
    .header(field_header())
    .block(panel(title));

    frame.render_widget(table, area);
}
