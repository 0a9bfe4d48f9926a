//! Plain text rendering

use std::fs;
use std::io;
use std::path::Path;

use super::{Report, Section};

/// Renders a report as plain text
///
/// Two-column sections are written as `field: value` lines; wider sections
/// as ` | `-separated rows under their header.
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&report.title);
    out.push('\n');
    out.push_str(&format!("Date generated: {}\n", report.generated_at));

    for section in &report.sections {
        out.push('\n');
        render_section(section, &mut out);
    }

    out
}

fn render_section(section: &Section, out: &mut String) {
    if let Some(heading) = &section.heading {
        out.push_str(heading);
        out.push('\n');
    }

    if section.header.len() == 2 {
        for row in &section.rows {
            out.push_str(&format!(
                "{}: {}\n",
                row.first().map(String::as_str).unwrap_or_default(),
                row.get(1).map(String::as_str).unwrap_or_default()
            ));
        }
    } else {
        out.push_str(&section.header.join(" | "));
        out.push('\n');
        for row in &section.rows {
            out.push_str(&row.join(" | "));
            out.push('\n');
        }
    }
}

pub fn write(report: &Report, path: &Path) -> io::Result<()> {
    fs::write(path, render(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(sections: Vec<Section>) -> Report {
        Report {
            title: "VIN Report: 1M8GDM9AXKP042788".to_string(),
            generated_at: "2025-06-01 14:30:00".to_string(),
            sections,
        }
    }

    #[test]
    fn test_two_column_sections_render_as_key_value_lines() {
        let text = render(&report(vec![Section {
            heading: None,
            header: vec!["Field".into(), "Value".into()],
            rows: vec![vec!["make".into(), "Ford".into()], vec!["year".into(), "2019".into()]],
        }]));

        assert_eq!(
            text,
            "VIN Report: 1M8GDM9AXKP042788\nDate generated: 2025-06-01 14:30:00\n\nmake: Ford\nyear: 2019\n"
        );
    }

    #[test]
    fn test_wide_sections_render_as_table_rows() {
        let text = render(&report(vec![Section {
            heading: Some("Compared".into()),
            header: vec!["Field".into(), "A".into(), "B".into()],
            rows: vec![vec!["make".into(), "Ford".into(), "VW".into()]],
        }]));

        assert!(text.contains("Compared\nField | A | B\nmake | Ford | VW\n"));
    }
}
