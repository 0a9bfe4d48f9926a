//! PDF rendering using the builtin Helvetica fonts on Letter pages

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::{ExportError, Report, Section};

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 12.0;
const LINE_HEIGHT: f32 = 5.5;
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
/// Rough average Helvetica glyph width at 10pt, used to truncate cells
const CHAR_WIDTH: f32 = 1.9;
/// Width of the first column in two-column tables
const FIELD_COLUMN_WIDTH: f32 = 55.0;

fn pdf_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Lays text out top to bottom, starting new pages as needed
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn line(&mut self, cells: &[(f32, f32, &str)], size: f32, bold: bool) {
        let height = LINE_HEIGHT * size / BODY_SIZE;
        self.ensure_room(height);
        self.y -= height;

        let font = if bold { &self.bold } else { &self.regular };
        for (x, width, text) in cells {
            self.layer
                .use_text(fit(text, *width, size), size, Mm(*x), Mm(self.y), font);
        }
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn save(self, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(pdf_error)
    }
}

/// Truncates text to roughly fit a column
fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = (width / (CHAR_WIDTH * size / BODY_SIZE)).max(4.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Left edge and width of each column
fn columns(count: usize) -> Vec<(f32, f32)> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    if count == 2 {
        return vec![
            (MARGIN, FIELD_COLUMN_WIDTH),
            (MARGIN + FIELD_COLUMN_WIDTH, usable - FIELD_COLUMN_WIDTH),
        ];
    }
    let width = usable / count.max(1) as f32;
    (0..count)
        .map(|i| (MARGIN + i as f32 * width, width))
        .collect()
}

fn cells<'a>(layout: &[(f32, f32)], row: &'a [String]) -> Vec<(f32, f32, &'a str)> {
    layout
        .iter()
        .zip(row.iter())
        .map(|((x, w), text)| (*x, *w, text.as_str()))
        .collect()
}

fn write_section(writer: &mut PageWriter, section: &Section) {
    let full_width = PAGE_WIDTH - 2.0 * MARGIN;
    if let Some(heading) = &section.heading {
        writer.line(&[(MARGIN, full_width, heading.as_str())], HEADING_SIZE, true);
    }

    let layout = columns(section.header.len());
    writer.line(&cells(&layout, &section.header), BODY_SIZE, true);
    for row in &section.rows {
        writer.line(&cells(&layout, row), BODY_SIZE, false);
    }
}

pub fn write(report: &Report, path: &Path) -> Result<(), ExportError> {
    let mut writer = PageWriter::new(&report.title)?;

    let full_width = PAGE_WIDTH - 2.0 * MARGIN;
    writer.line(&[(MARGIN, full_width, report.title.as_str())], TITLE_SIZE, true);
    writer.gap();
    let generated = format!("Date generated: {}", report.generated_at);
    writer.line(&[(MARGIN, full_width, generated.as_str())], BODY_SIZE, false);

    for section in &report.sections {
        writer.gap();
        write_section(&mut writer, section);
    }

    writer.save(path)
}
