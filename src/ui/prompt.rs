//! Single-line text prompt

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::panel;

pub fn render(frame: &mut Frame, area: Rect, label: &str, input: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::styled(input.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("\u{2588}", Style::default().fg(Color::Gray)), // █ cursor
    ]);

    let paragraph = Paragraph::new(line).block(panel(format!(" {} ", label)));
    frame.render_widget(paragraph, chunks[0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_prompt_shows_label_and_input() {
        let backend = TestBackend::new(60, 6);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, area, "Please enter VIN number", "1M8GDM");
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(content.contains("Please enter VIN number"));
        assert!(content.contains("> 1M8GDM"));
    }
}
