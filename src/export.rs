//! Document Exporter: renders a subject's records into a paginated PDF.
//!
//! Two steps:
//! 1. [`layout_document`] places every line on A4 pages (pure, testable)
//! 2. [`render_pdf`] draws that layout with `printpdf`
//!
//! Positions in the layout are millimetres from the top of the page.
//! Sections keep the input order; nothing is re-sorted.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use printpdf::*;
use thiserror::Error;

use crate::models::{MedicalRecord, UserProfile};

// ─── Page geometry ────────────────────────────────────────────────────────────

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;
/// Cursor position at the top of every page.
pub const TOP_MM: f32 = 30.0;
/// A section never starts below this line.
pub const SAFE_AREA_LIMIT_MM: f32 = 250.0;
/// Lowest position a section's closing rule may reach when it can move to a
/// fresh page instead.
pub const BOTTOM_LIMIT_MM: f32 = 287.0;

const TITLE_SIZE: f32 = 20.0;
const IDENTITY_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 16.0;
const FIELD_SIZE: f32 = 12.0;

const TITLE_ADVANCE: f32 = 20.0;
const IDENTITY_LINE: f32 = 10.0;
const IDENTITY_GAP: f32 = 20.0;
const HEADING_ADVANCE: f32 = 15.0;
const FIELD_LINE: f32 = 8.0;
const SECTION_GAP: f32 = 10.0;
const RULE_GAP: f32 = 15.0;

/// Characters per field line at 12pt across the printable width.
const WRAP_CHARS: usize = 80;

pub const DOCUMENT_TITLE: &str = "Medical Records";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No medical records to export")]
    NoRecords,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Layout ───────────────────────────────────────────────────────────────────

/// One labelled value inside a record section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Title,
    Identity,
    Heading,
    Field,
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutItem {
    pub kind: ItemKind,
    /// Empty for rules.
    pub text: String,
    pub y_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<LayoutItem>,
}

/// Where one record section landed.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    pub record_id: i64,
    pub page: usize,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub title: String,
    pub pages: Vec<PageLayout>,
    pub sections: Vec<SectionLayout>,
}

/// Non-empty fields of a record, in print order. Follow-up is always
/// present and reads `Not scheduled` when unset.
pub fn section_fields(record: &MedicalRecord) -> Vec<RecordField> {
    let date = record.date.with_timezone(&Local);
    let candidates = [
        ("Date", date.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("Doctor", record.doctor_name.clone()),
        ("Specialization", record.specialization.clone()),
        ("Diagnosis", record.diagnosis.clone()),
        ("Treatment", record.treatment.clone()),
        ("Medications", record.medications.clone()),
        ("Allergies", record.allergies.clone()),
        ("Severity", record.severity.as_str().to_string()),
        ("Notes", record.notes.clone()),
        (
            "Follow-up",
            record
                .follow_up_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Not scheduled".to_string()),
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| RecordField {
            label,
            value: value.trim().to_string(),
        })
        .collect()
}

/// Places the title, identity block and one section per record on pages.
pub fn layout_document(subject: &UserProfile, records: &[MedicalRecord]) -> DocumentLayout {
    let mut pages = vec![PageLayout::default()];
    let mut sections = Vec::with_capacity(records.len());
    let mut y = TOP_MM;

    let push = |pages: &mut Vec<PageLayout>, kind: ItemKind, text: String, y_mm: f32| {
        if let Some(page) = pages.last_mut() {
            page.items.push(LayoutItem { kind, text, y_mm });
        }
    };

    push(&mut pages, ItemKind::Title, DOCUMENT_TITLE.to_string(), y);
    y += TITLE_ADVANCE;

    push(&mut pages, ItemKind::Identity, format!("Patient: {}", subject.name), y);
    y += IDENTITY_LINE;
    push(&mut pages, ItemKind::Identity, format!("Health ID: {}", subject.health_id), y);
    y += IDENTITY_LINE;
    push(&mut pages, ItemKind::Identity, format!("Aadhaar: {}", subject.masked_id()), y);
    y += IDENTITY_GAP;

    for (index, record) in records.iter().enumerate() {
        let fields = section_fields(record);
        let lines: Vec<String> = fields
            .iter()
            .flat_map(|f| wrap_text(&format!("{}: {}", f.label, f.value), WRAP_CHARS))
            .collect();

        let rule_at = y + HEADING_ADVANCE + lines.len() as f32 * FIELD_LINE + SECTION_GAP;
        let at_top = y <= TOP_MM;
        if y > SAFE_AREA_LIMIT_MM || (!at_top && rule_at > BOTTOM_LIMIT_MM) {
            pages.push(PageLayout::default());
            y = TOP_MM;
        }

        push(&mut pages, ItemKind::Heading, format!("Record {}", index + 1), y);
        y += HEADING_ADVANCE;
        for line in lines {
            push(&mut pages, ItemKind::Field, line, y);
            y += FIELD_LINE;
        }
        y += SECTION_GAP;
        push(&mut pages, ItemKind::Rule, String::new(), y);
        y += RULE_GAP;

        sections.push(SectionLayout {
            record_id: record.id,
            page: pages.len() - 1,
            fields,
        });
    }

    DocumentLayout {
        title: DOCUMENT_TITLE.to_string(),
        pages,
        sections,
    }
}

// ─── PDF rendering ────────────────────────────────────────────────────────────

/// Draws a layout as a PDF. Returns PDF bytes.
pub fn render_pdf(layout: &DocumentLayout) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        for item in &page.items {
            let y = Mm(PAGE_HEIGHT_MM - item.y_mm);
            match item.kind {
                ItemKind::Title => {
                    let x = centered_x(&item.text, TITLE_SIZE);
                    layer.use_text(&item.text, TITLE_SIZE, Mm(x), y, &bold);
                }
                ItemKind::Identity => {
                    layer.use_text(&item.text, IDENTITY_SIZE, Mm(MARGIN_MM), y, &font);
                }
                ItemKind::Heading => {
                    layer.use_text(&item.text, HEADING_SIZE, Mm(MARGIN_MM), y, &bold);
                }
                ItemKind::Field => {
                    layer.use_text(&item.text, FIELD_SIZE, Mm(MARGIN_MM), y, &font);
                }
                ItemKind::Rule => {
                    layer.set_outline_thickness(0.5);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(MARGIN_MM), y), false),
                            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), y), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
}

/// Approximate left edge for centred Helvetica text (average glyph ≈ 0.5em).
fn centered_x(text: &str, size_pt: f32) -> f32 {
    const MM_PER_PT: f32 = 0.3528;
    let width = text.chars().count() as f32 * size_pt * 0.5 * MM_PER_PT;
    ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
}

// ─── Export artifact ──────────────────────────────────────────────────────────

/// A rendered export, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub section_count: usize,
}

impl ExportedDocument {
    /// Writes the PDF into `dir` (created if needed). Returns the file path.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), "Medical records exported");
        Ok(path)
    }
}

/// `{name}_Medical_Records_{YYYY-MM-DD}.pdf`. Path separators in the name
/// become `_`.
pub fn export_filename(name: &str, date: NaiveDate) -> String {
    let safe_name: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe_name}_Medical_Records_{}.pdf", date.format("%Y-%m-%d"))
}

/// Exports with today's local date in the filename.
pub fn export_records(
    subject: &UserProfile,
    records: &[MedicalRecord],
) -> Result<ExportedDocument, ExportError> {
    export_records_on(subject, records, Local::now().date_naive())
}

pub fn export_records_on(
    subject: &UserProfile,
    records: &[MedicalRecord],
    export_date: NaiveDate,
) -> Result<ExportedDocument, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let layout = layout_document(subject, records);
    let bytes = render_pdf(&layout)?;
    tracing::debug!(
        subject = %subject.health_id,
        sections = layout.sections.len(),
        pages = layout.pages.len(),
        "Rendered medical records PDF"
    );

    Ok(ExportedDocument {
        filename: export_filename(&subject.name, export_date),
        bytes,
        page_count: layout.pages.len(),
        section_count: layout.sections.len(),
    })
}

/// Simple word-wrap helper for PDF text rendering. Words longer than a
/// line are split at `max_chars`.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            if current_len > 0 && current_len + piece.len() + 1 > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ─── Tests ────────────────────────────────────────────────────────────────────
