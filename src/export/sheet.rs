//! Spreadsheet (CSV) rendering

use std::io;
use std::path::Path;

use csv::WriterBuilder;

use super::Report;

fn write_to<W: io::Write>(report: &Report, writer: W) -> Result<(), csv::Error> {
    // Title, header and data rows have different widths
    let mut out = WriterBuilder::new().flexible(true).from_writer(writer);

    out.write_record([report.title.as_str()])?;
    out.write_record(["Date generated", report.generated_at.as_str()])?;

    for section in &report.sections {
        if let Some(heading) = &section.heading {
            out.write_record([heading.as_str()])?;
        }
        out.write_record(&section.header)?;
        for row in &section.rows {
            out.write_record(row)?;
        }
    }

    out.flush()?;
    Ok(())
}

pub fn write(report: &Report, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_to(report, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Section;

    #[test]
    fn test_rows_are_quoted_and_flexible() {
        let report = Report {
            title: "VIN Lookup History".to_string(),
            generated_at: "2025-06-01 14:30:00".to_string(),
            sections: vec![Section {
                heading: None,
                header: vec!["No.".into(), "VIN".into(), "Model".into()],
                rows: vec![vec!["1".into(), "1M8GDM9AXKP042788".into(), "F-150, XLT".into()]],
            }],
        };

        let mut buf = Vec::new();
        write_to(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "VIN Lookup History\nDate generated,2025-06-01 14:30:00\nNo.,VIN,Model\n1,1M8GDM9AXKP042788,\"F-150, XLT\"\n"
        );
    }
}
