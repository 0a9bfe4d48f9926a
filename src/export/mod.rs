//! Document export
//!
//! Every exportable view (one vehicle, a batch, a comparison, the history) is
//! first turned into a [`Report`]: a title plus sections of tabular rows. The
//! text, PDF and spreadsheet renderers only know about reports.

mod pdf;
mod sheet;
mod text;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::cache::History;
use crate::data::{VehicleRecord, Vin};
use crate::service::Comparison;

/// Errors that can occur while writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write spreadsheet: {0}")]
    Sheet(#[from] csv::Error),

    #[error("failed to build PDF: {0}")]
    Pdf(String),

    /// Nothing to export, e.g. an empty history
    #[error("nothing to export")]
    Empty,
}

/// Output document types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Pdf,
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Spreadsheet => "csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Text => "TXT",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Spreadsheet => "spreadsheet",
        }
    }
}

/// What to export
#[derive(Debug, Clone, Copy)]
pub enum Document<'a> {
    Vehicle {
        vin: &'a Vin,
        record: &'a VehicleRecord,
    },
    Batch(&'a [(Vin, VehicleRecord)]),
    Comparison(&'a Comparison),
    History(&'a History),
}

/// A block of rows under an optional heading
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Renderer-neutral document content
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub generated_at: String,
    pub sections: Vec<Section>,
}

fn field_rows(record: &VehicleRecord) -> Vec<Vec<String>> {
    record
        .iter()
        .map(|(key, value)| vec![key.to_string(), value.to_string()])
        .collect()
}

fn field_header() -> Vec<String> {
    vec!["Field".to_string(), "Value".to_string()]
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| "N/A".to_string())
}

impl Report {
    /// Builds the report for a document at the given time
    pub fn build(document: &Document<'_>, now: DateTime<Local>) -> Self {
        let generated_at = now.format("%Y-%m-%d %H:%M:%S").to_string();

        match document {
            Document::Vehicle { vin, record } => Report {
                title: format!("VIN Report: {}", vin),
                generated_at,
                sections: vec![Section {
                    heading: None,
                    header: field_header(),
                    rows: field_rows(record),
                }],
            },
            Document::Batch(results) => Report {
                title: "Batch VIN Lookup Report".to_string(),
                generated_at,
                sections: results
                    .iter()
                    .map(|(vin, record)| Section {
                        heading: Some(format!("VIN: {}", vin)),
                        header: field_header(),
                        rows: field_rows(record),
                    })
                    .collect(),
            },
            Document::Comparison(comparison) => Report {
                title: format!(
                    "VIN Comparison: {} vs {}",
                    comparison.first_vin, comparison.second_vin
                ),
                generated_at,
                sections: vec![Section {
                    heading: None,
                    header: vec![
                        "Field".to_string(),
                        comparison.first_vin.to_string(),
                        comparison.second_vin.to_string(),
                    ],
                    rows: comparison
                        .rows()
                        .iter()
                        .map(|row| {
                            vec![
                                row.field.to_string(),
                                or_na(row.first.map(ToString::to_string)),
                                or_na(row.second.map(ToString::to_string)),
                            ]
                        })
                        .collect(),
                }],
            },
            Document::History(history) => Report {
                title: "VIN Lookup History".to_string(),
                generated_at,
                sections: vec![Section {
                    heading: None,
                    header: ["No.", "VIN", "Make", "Model", "Year", "Date & Time"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    rows: history
                        .iter()
                        .enumerate()
                        .map(|(i, entry)| {
                            vec![
                                (i + 1).to_string(),
                                or_na(entry.vin.clone()),
                                or_na(entry.data.make().map(ToString::to_string)),
                                or_na(entry.data.model().map(ToString::to_string)),
                                or_na(entry.data.year().map(ToString::to_string)),
                                entry.display_timestamp(),
                            ]
                        })
                        .collect(),
                }],
            },
        }
    }
}

/// File name for a document, following the `{VIN}_data.txt` /
/// `batch_vin_lookup_{stamp}.pdf` naming scheme
pub fn file_name(document: &Document<'_>, format: ExportFormat, now: DateTime<Local>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    let ext = format.extension();
    match document {
        Document::Vehicle { vin, .. } => format!("{}_data.{}", vin, ext),
        Document::Batch(_) => format!("batch_vin_lookup_{}.{}", stamp, ext),
        Document::Comparison(c) => format!("comparison_{}_{}.{}", c.first_vin, c.second_vin, ext),
        Document::History(_) => format!("vin_history_{}.{}", stamp, ext),
    }
}

fn is_empty(document: &Document<'_>) -> bool {
    match document {
        Document::Batch(results) => results.is_empty(),
        Document::History(history) => history.is_empty(),
        _ => false,
    }
}

/// Writes `document` into `dir` in the given format
///
/// # Returns
/// * `Ok(PathBuf)` - where the file was written
/// * `Err(ExportError::Empty)` - for an empty batch or history
/// * `Err(ExportError)` - if the directory or file cannot be written
pub fn export(document: &Document<'_>, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
    if is_empty(document) {
        return Err(ExportError::Empty);
    }

    let now = Local::now();
    let report = Report::build(document, now);

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(document, format, now));

    match format {
        ExportFormat::Text => text::write(&report, &path)?,
        ExportFormat::Pdf => pdf::write(&report, &path)?,
        ExportFormat::Spreadsheet => sheet::write(&report, &path)?,
    }

    info!(path = %path.display(), format = format.label(), "exported document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::HistoryEntry;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn vin(s: &str) -> Vin {
        Vin::parse(s).unwrap()
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap()
    }

    fn ford() -> VehicleRecord {
        [("vin", "1M8GDM9AXKP042788"), ("make", "Ford"), ("model", "F-150")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_vehicle_report_lists_fields_in_order() {
        let v = vin("1M8GDM9AXKP042788");
        let record = ford();
        let report = Report::build(&Document::Vehicle { vin: &v, record: &record }, fixed_now());

        assert_eq!(report.title, "VIN Report: 1M8GDM9AXKP042788");
        assert_eq!(report.generated_at, "2025-06-01 14:30:00");
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].rows[1], vec!["make", "Ford"]);
    }

    #[test]
    fn test_batch_report_has_section_per_vin() {
        let results = vec![
            (vin("1M8GDM9AXKP042788"), ford()),
            (vin("WVWZZZ1JZXW000001"), VehicleRecord::new()),
        ];
        let report = Report::build(&Document::Batch(&results), fixed_now());

        assert_eq!(report.sections.len(), 2);
        assert_eq!(
            report.sections[1].heading.as_deref(),
            Some("VIN: WVWZZZ1JZXW000001")
        );
    }

    #[test]
    fn test_history_report_uses_na_for_missing_values() {
        let history = History::from(vec![HistoryEntry {
            timestamp: "2025-01-02T03:04:05".to_string(),
            vin: None,
            data: VehicleRecord::new(),
        }]);
        let report = Report::build(&Document::History(&history), fixed_now());

        assert_eq!(
            report.sections[0].rows[0],
            vec!["1", "N/A", "N/A", "N/A", "N/A", "2025-01-02 03:04:05"]
        );
    }

    #[test]
    fn test_file_names() {
        let v = vin("1M8GDM9AXKP042788");
        let record = ford();
        let doc = Document::Vehicle { vin: &v, record: &record };
        assert_eq!(
            file_name(&doc, ExportFormat::Text, fixed_now()),
            "1M8GDM9AXKP042788_data.txt"
        );

        let history = History::new();
        assert_eq!(
            file_name(&Document::History(&history), ExportFormat::Spreadsheet, fixed_now()),
            "vin_history_20250601_143000.csv"
        );
    }

    #[test]
    fn test_export_empty_history_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let history = History::new();
        let err = export(&Document::History(&history), ExportFormat::Text, temp_dir.path())
            .unwrap_err();
        assert!(matches!(err, ExportError::Empty));
    }

    #[test]
    fn test_export_vehicle_in_every_format() {
        let temp_dir = TempDir::new().unwrap();
        let v = vin("1M8GDM9AXKP042788");
        let record = ford();
        let doc = Document::Vehicle { vin: &v, record: &record };

        for format in [ExportFormat::Text, ExportFormat::Pdf, ExportFormat::Spreadsheet] {
            let path = export(&doc, format, temp_dir.path()).unwrap();
            assert!(path.exists(), "{:?} export should exist", format);
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_export_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("exports").join("vin");
        let v = vin("1M8GDM9AXKP042788");
        let record = ford();

        let path = export(
            &Document::Vehicle { vin: &v, record: &record },
            ExportFormat::Text,
            &dir,
        )
        .unwrap();

        assert!(path.starts_with(&dir));
    }
}
