use std::io;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Datelike, NaiveDate};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::RenderError;
use crate::workflows::interview::domain::{IncomeField, InterviewRecord};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: Mm = Mm(14.0);
const TOP_START: Mm = Mm(277.0);
const FOOTER_Y: Mm = Mm(10.0);
const BOTTOM_LIMIT: Mm = Mm(24.0);
const LINE_DROP: Mm = Mm(7.0);
const HEADING_DROP: Mm = Mm(11.0);
const NOTE_DROP: Mm = Mm(10.0);
const TABLE_GAP: Mm = Mm(3.5);
const TABLE_MIN_ROOM: Mm = Mm(14.0);
const SECOND_COLUMN: Mm = Mm(110.0);
const WIDE_SECOND_COLUMN: Mm = Mm(90.0);
const THIRD_COLUMN: Mm = Mm(150.0);

const FOOTER_TEXT: &str =
    "This document is a summary of provided information and not an official IRS form.";

/// Rendered summary bytes with the two output adapters: save to a file for
/// a local download, or base64 for embedding in a submission payload.
#[derive(Debug, Clone)]
pub struct SummaryDocument {
    bytes: Vec<u8>,
}

impl SummaryDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// One table of the summary. The first header cell doubles as the section
/// title, matching the printed layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryTable {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryLayout {
    pub(crate) title: String,
    pub(crate) generated_on: String,
    pub(crate) tables: Vec<SummaryTable>,
}

/// Pure layout pass: fixed sections in order, independent of the PDF
/// backend. Positions and pagination are computed later by the writer.
pub(crate) fn summary_layout(record: &InterviewRecord, today: NaiveDate) -> SummaryLayout {
    let tax_year = today.year() - 1;

    let mut tables = vec![
        SummaryTable {
            header: vec!["Personal Information".to_string(), String::new()],
            rows: vec![
                vec!["Full Name".to_string(), record.full_name()],
                vec!["SSN".to_string(), record.ssn.clone()],
                vec!["Address".to_string(), record.address.clone()],
                vec![
                    "City, State, Zip".to_string(),
                    format!("{}, {} {}", record.city, record.state, record.zip),
                ],
                vec!["Phone".to_string(), record.phone.clone()],
            ],
        },
        SummaryTable {
            header: vec!["Filing Status & Dependents".to_string(), String::new()],
            rows: vec![
                vec![
                    "Status".to_string(),
                    record.filing_status.label().to_string(),
                ],
                vec![
                    "Dependents Count".to_string(),
                    record.dependents.len().to_string(),
                ],
            ],
        },
    ];

    if !record.dependents.is_empty() {
        tables.push(SummaryTable {
            header: vec![
                "Dependent Name".to_string(),
                "SSN".to_string(),
                "Relationship".to_string(),
            ],
            rows: record
                .dependents
                .iter()
                .map(|dependent| {
                    vec![
                        dependent.name.clone(),
                        dependent.ssn.clone(),
                        dependent.relationship.clone(),
                    ]
                })
                .collect(),
        });
    }

    tables.push(SummaryTable {
        header: vec!["Income Source".to_string(), "Amount".to_string()],
        rows: IncomeField::ordered()
            .into_iter()
            .map(|field| {
                vec![
                    field.label().to_string(),
                    format!("${}", record.income_display(field)),
                ]
            })
            .collect(),
    });

    SummaryLayout {
        title: format!("Tax Interview Summary {tax_year}"),
        generated_on: format!("Generated on: {}", today.format("%m/%d/%Y")),
        tables,
    }
}

/// Render the printable summary for a record. Pure in its inputs: the same
/// record and date produce the same layout.
pub fn render_summary(
    record: &InterviewRecord,
    today: NaiveDate,
) -> Result<SummaryDocument, RenderError> {
    let layout = summary_layout(record, today);

    let (doc, page, layer) = PdfDocument::new(&layout.title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    {
        let mut cursor = PageCursor {
            doc: &doc,
            regular: &regular,
            bold: &bold,
            layer: doc.get_page(page).get_layer(layer),
            y: TOP_START,
        };
        cursor.draw_footer();
        cursor.heading(&layout.title);
        cursor.note(&layout.generated_on);
        for table in &layout.tables {
            cursor.table(table);
        }
    }

    let bytes = doc.save_to_bytes()?;
    Ok(SummaryDocument { bytes })
}

/// Walks the layout down the page, breaking to a new page (with its own
/// footer) whenever the next line would cross the bottom limit.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    layer: PdfLayerReference,
    y: Mm,
}

impl PageCursor<'_> {
    fn draw_footer(&self) {
        self.layer
            .use_text(FOOTER_TEXT, 8.0, MARGIN, FOOTER_Y, self.regular);
    }

    fn break_page(&mut self) {
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP_START;
        self.draw_footer();
    }

    fn ensure_room(&mut self, needed: Mm) {
        if self.y.0 - needed.0 < BOTTOM_LIMIT.0 {
            self.break_page();
        }
    }

    fn drop_by(&mut self, amount: Mm) {
        self.y = Mm(self.y.0 - amount.0);
    }

    fn heading(&mut self, text: &str) {
        self.ensure_room(HEADING_DROP);
        let bold = self.bold;
        self.layer.use_text(text, 22.0, MARGIN, self.y, bold);
        self.drop_by(HEADING_DROP);
    }

    fn note(&mut self, text: &str) {
        self.ensure_room(NOTE_DROP);
        let regular = self.regular;
        self.layer.use_text(text, 10.0, MARGIN, self.y, regular);
        self.drop_by(NOTE_DROP);
    }

    fn table(&mut self, table: &SummaryTable) {
        self.ensure_room(TABLE_MIN_ROOM);
        let bold = self.bold;
        self.write_cells(&table.header, bold, true);
        let regular = self.regular;
        for row in &table.rows {
            self.write_cells(row, regular, false);
        }
        self.drop_by(TABLE_GAP);
    }

    fn write_cells(&mut self, cells: &[String], font: &IndirectFontRef, emphasized: bool) {
        self.ensure_room(LINE_DROP);
        let size = if emphasized { 11.0 } else { 10.0 };
        for (cell, x) in cells.iter().zip(column_offsets(cells.len()).iter()) {
            if !cell.is_empty() {
                self.layer.use_text(cell, size, *x, self.y, font);
            }
        }
        self.drop_by(LINE_DROP);
    }
}

fn column_offsets(columns: usize) -> &'static [Mm] {
    match columns {
        0 | 1 => &[MARGIN],
        2 => &[MARGIN, SECOND_COLUMN],
        _ => &[MARGIN, WIDE_SECOND_COLUMN, THIRD_COLUMN],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::domain::Dependent;

    fn sample_record() -> InterviewRecord {
        InterviewRecord {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            wages: "50000".to_string(),
            ..InterviewRecord::default()
        }
    }

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 3).expect("valid date")
    }

    #[test]
    fn layout_is_idempotent_for_identical_inputs() {
        let record = sample_record();
        let first = summary_layout(&record, sample_date());
        let second = summary_layout(&record, sample_date());
        assert_eq!(first, second);
    }

    #[test]
    fn layout_reports_prior_tax_year_and_currency_defaults() {
        let layout = summary_layout(&sample_record(), sample_date());
        assert_eq!(layout.title, "Tax Interview Summary 2025");
        assert_eq!(layout.generated_on, "Generated on: 02/03/2026");

        let income = layout.tables.last().expect("income table");
        assert_eq!(income.header[0], "Income Source");
        assert!(income
            .rows
            .iter()
            .any(|row| row[0] == "Wages, Salaries, Tips" && row[1] == "$50000"));
        assert!(income
            .rows
            .iter()
            .any(|row| row[0] == "Unemployment Comp." && row[1] == "$0"));
    }

    #[test]
    fn dependents_table_appears_only_when_present() {
        let record = sample_record();
        let without = summary_layout(&record, sample_date());
        assert_eq!(without.tables.len(), 3);

        let mut record = record;
        record.dependents.push(Dependent {
            name: "Sam Doe".to_string(),
            ssn: "000-00-0001".to_string(),
            relationship: "Son".to_string(),
        });
        let with = summary_layout(&record, sample_date());
        assert_eq!(with.tables.len(), 4);
        assert_eq!(with.tables[2].header[0], "Dependent Name");
        assert_eq!(with.tables[2].rows.len(), 1);
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let document = render_summary(&sample_record(), sample_date()).expect("summary renders");
        assert!(document.bytes().starts_with(b"%PDF"));
        assert!(document.bytes().len() > 500);
        assert!(!document.to_base64().is_empty());
    }

    #[test]
    fn render_tolerates_a_completely_empty_record() {
        let document =
            render_summary(&InterviewRecord::default(), sample_date()).expect("summary renders");
        assert!(document.bytes().starts_with(b"%PDF"));
    }

    #[test]
    fn many_dependents_spill_onto_additional_pages() {
        let mut record = sample_record();
        for index in 0..60 {
            record.dependents.push(Dependent {
                name: format!("Dependent {index}"),
                ssn: format!("000-00-{index:04}"),
                relationship: "Child".to_string(),
            });
        }
        let document = render_summary(&record, sample_date()).expect("summary renders");
        assert!(document.bytes().starts_with(b"%PDF"));
    }
}
