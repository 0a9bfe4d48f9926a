//! Main menu screen with the welcome banner

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::panel;

const CAR: [&str; 4] = [
    r"    ______",
    r"   /|_||_\`.__",
    r"  (   _    _ _\",
    r"  =`-(_)--(_)-'",
];

fn option_line(label: &str, key: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<22}", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("Press "),
        Span::styled(key.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ])
}

pub fn render(frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = CAR
        .iter()
        .map(|row| Line::from(Span::styled(row.to_string(), Style::default().fg(Color::Cyan))))
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Welcome to VIN CLI!",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "A fast and elegant tool for decoding vehicle VIN numbers.",
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(""));
    lines.push(option_line("New Lookup", "N", Color::Cyan));
    lines.push(option_line("Batch Lookup", "B", Color::Cyan));
    lines.push(option_line("Compare VINs", "C", Color::Cyan));
    lines.push(option_line("View / manage history", "H", Color::Cyan));
    lines.push(option_line("Exit", "E", Color::Red));

    let paragraph = Paragraph::new(lines)
        .block(panel(" VIN CLI ".to_string()))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
