//! PDF table export of a record projection.
//!
//! Produces A4 pages holding a bordered table: a shaded header row in
//! Helvetica-Bold followed by one row per record in Helvetica. The header is
//! repeated on every page and rows flow onto as many pages as needed.
//! Text is written with the standard WinAnsi encoding; characters outside it
//! are replaced by `?`.

use crate::error::{Error, Result};
use crate::types::{ensure_columns, Column, TransferRecord};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::io::Write;

const A4_SHORT: i64 = 595;
const A4_LONG: i64 = 842;
const MARGIN: i64 = 36;
const TITLE_BLOCK: i64 = 28;
const TITLE_SIZE: i64 = 14;
const FONT_SIZE: i64 = 8;
const ROW_HEIGHT: i64 = 16;
const CELL_PADDING: i64 = 4;
// average Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f32 = 0.55;

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

/// PDF writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// Heading printed above the table on every page.
    pub title: String,
    pub orientation: Orientation,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: "Bonifici".to_string(),
            orientation: Orientation::Landscape,
        }
    }
}

/// Writes records as a paginated PDF table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfExporter {
    pub options: PdfOptions,
}

impl PdfExporter {
    /// Exporter laying pages out with `options`.
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    /// Write `records` projected onto `columns` to any destination implementing `Write`.
    pub fn write_to<W: Write>(
        &self,
        records: &[TransferRecord],
        columns: &[Column],
        writer: &mut W,
    ) -> Result<()> {
        ensure_columns(columns)?;

        let mut doc = self.build_document(records, columns)?;
        doc.compress();
        doc.save_to(writer)
            .map_err(|e| Error::PdfError(e.to_string()))?;
        Ok(())
    }

    /// Same as [`PdfExporter::write_to`], collected into a buffer.
    pub fn to_bytes(&self, records: &[TransferRecord], columns: &[Column]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(records, columns, &mut buffer)?;
        Ok(buffer)
    }

    fn page_size(&self) -> (i64, i64) {
        match self.options.orientation {
            Orientation::Portrait => (A4_SHORT, A4_LONG),
            Orientation::Landscape => (A4_LONG, A4_SHORT),
        }
    }

    /// Body rows that fit below the title and header row.
    pub(crate) fn rows_per_page(&self) -> usize {
        let (_, height) = self.page_size();
        let usable = height - 2 * MARGIN - TITLE_BLOCK - ROW_HEIGHT;
        (usable / ROW_HEIGHT).max(1) as usize
    }

    fn build_document(&self, records: &[TransferRecord], columns: &[Column]) -> Result<Document> {
        let (width, height) = self.page_size();
        let layout = TableLayout::new(columns, width - 2 * MARGIN);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary("Helvetica"));
        let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let chunks: Vec<&[TransferRecord]> = if records.is_empty() {
            vec![records]
        } else {
            records.chunks(self.rows_per_page()).collect()
        };
        let page_count = chunks.len();

        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(page_count);
        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut page = PageWriter::new(height);
            page.heading(&self.options.title, index + 1, page_count, width);
            page.header_row(&layout, columns);
            for (row, record) in chunk.iter().enumerate() {
                page.body_row(&layout, columns, record, row + 1);
            }

            let content = Content {
                operations: page.operations,
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            page_ids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }));
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&self.options.title)),
            "Producer" => Object::string_literal("bonifici_core"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        tracing::debug!("Built PDF table: {} rows on {} pages", records.len(), page_count);
        Ok(doc)
    }
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Horizontal placement of the table columns.
struct TableLayout {
    lefts: Vec<i64>,
    widths: Vec<i64>,
}

impl TableLayout {
    fn new(columns: &[Column], table_width: i64) -> Self {
        let weights: Vec<i64> = columns.iter().map(column_weight).collect();
        let total: i64 = weights.iter().sum();

        let mut lefts = Vec::with_capacity(columns.len());
        let mut widths = Vec::with_capacity(columns.len());
        let mut x = MARGIN;
        for (i, weight) in weights.iter().enumerate() {
            // last column absorbs the rounding remainder
            let w = if i + 1 == weights.len() {
                MARGIN + table_width - x
            } else {
                table_width * weight / total
            };
            lefts.push(x);
            widths.push(w);
            x += w;
        }

        Self { lefts, widths }
    }
}

fn column_weight(column: &Column) -> i64 {
    match column {
        Column::Date => 10,
        Column::Recipient => 24,
        Column::Iban => 26,
        Column::Amount => 12,
        Column::Remittance => 28,
        Column::Originator => 20,
        Column::IbanValid => 9,
    }
}

/// Accumulates the content stream of one page.
struct PageWriter {
    operations: Vec<Operation>,
    /// Bottom edge of the title area; table rows hang below it.
    table_top: i64,
}

impl PageWriter {
    fn new(page_height: i64) -> Self {
        Self {
            operations: Vec::new(),
            table_top: page_height - MARGIN - TITLE_BLOCK,
        }
    }

    fn heading(&mut self, title: &str, page: usize, pages: usize, page_width: i64) {
        let baseline = self.table_top + TITLE_BLOCK - TITLE_SIZE;
        self.text("F2", TITLE_SIZE, MARGIN, baseline, title);

        let counter = format!("Pagina {} di {}", page, pages);
        let x = page_width - MARGIN - text_width(&counter, FONT_SIZE);
        self.text("F1", FONT_SIZE, x, baseline, &counter);
    }

    fn header_row(&mut self, layout: &TableLayout, columns: &[Column]) {
        let y = self.table_top - ROW_HEIGHT;
        let table_width: i64 = layout.widths.iter().sum();

        self.operations.push(Operation::new(
            "rg",
            vec![Object::Real(0.85), Object::Real(0.88), Object::Real(0.93)],
        ));
        self.rect(MARGIN, y, table_width, ROW_HEIGHT, "f");
        self.operations.push(Operation::new(
            "rg",
            vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        ));

        for (i, column) in columns.iter().enumerate() {
            self.cell(layout, i, y, "F2", column.label(), false);
        }
    }

    fn body_row(&mut self, layout: &TableLayout, columns: &[Column], record: &TransferRecord, row: usize) {
        let y = self.table_top - ROW_HEIGHT * (row as i64 + 1);
        for (i, column) in columns.iter().enumerate() {
            let right_aligned = *column == Column::Amount;
            self.cell(layout, i, y, "F1", &column.render(record), right_aligned);
        }
    }

    fn cell(&mut self, layout: &TableLayout, index: usize, y: i64, font: &str, value: &str, right_aligned: bool) {
        let left = layout.lefts[index];
        let width = layout.widths[index];

        self.operations
            .push(Operation::new("w", vec![Object::Real(0.5)]));
        self.rect(left, y, width, ROW_HEIGHT, "S");

        let value = fit_text(value, width - 2 * CELL_PADDING, FONT_SIZE);
        let x = if right_aligned {
            left + width - CELL_PADDING - text_width(&value, FONT_SIZE)
        } else {
            left + CELL_PADDING
        };
        self.text(font, FONT_SIZE, x, y + (ROW_HEIGHT - FONT_SIZE) / 2 + 1, &value);
    }

    fn rect(&mut self, x: i64, y: i64, width: i64, height: i64, paint: &str) {
        self.operations.push(Operation::new(
            "re",
            vec![
                Object::Integer(x),
                Object::Integer(y),
                Object::Integer(width),
                Object::Integer(height),
            ],
        ));
        self.operations.push(Operation::new(paint, vec![]));
    }

    fn text(&mut self, font: &str, size: i64, x: i64, y: i64, value: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
        ));
        self.operations.push(Operation::new(
            "Td",
            vec![Object::Integer(x), Object::Integer(y)],
        ));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(value))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }
}

/// Approximate rendered width in points.
fn text_width(value: &str, size: i64) -> i64 {
    (value.chars().count() as f32 * size as f32 * GLYPH_WIDTH).ceil() as i64
}

/// Shorten `value` with an ellipsis so it fits `available` points.
fn fit_text(value: &str, available: i64, size: i64) -> String {
    let max_chars = (available as f32 / (size as f32 * GLYPH_WIDTH)).floor().max(1.0) as usize;
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    let mut shortened: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

/// Encode text for a WinAnsiEncoding standard font.
fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(i: usize) -> TransferRecord {
        TransferRecord {
            execution_date: "2024-06-03".into(),
            recipient_name: format!("Fornitore {} – Società Agricola Cooperativa", i),
            recipient_iban: "IT60X0542811101000000123456".into(),
            amount: Decimal::new(i as i64 * 1001, 2),
            remittance_info: "Saldo €".into(),
            originator_name: "ACME".into(),
            batch: None,
            iban_valid: None,
        }
    }

    fn columns() -> Vec<Column> {
        Column::default_selection()
    }

    #[test]
    fn test_output_is_a_loadable_pdf() {
        let records: Vec<TransferRecord> = (1..=5).map(record).collect();
        let bytes = PdfExporter::default().to_bytes(&records, &columns()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_pagination() {
        let exporter = PdfExporter::default();
        let per_page = exporter.rows_per_page();
        let records: Vec<TransferRecord> = (1..=per_page * 2 + 1).map(record).collect();

        let bytes = exporter.to_bytes(&records, &columns()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_portrait_fits_more_rows() {
        let portrait = PdfExporter::new(PdfOptions {
            title: "Distinta".into(),
            orientation: Orientation::Portrait,
        });
        assert!(portrait.rows_per_page() > PdfExporter::default().rows_per_page());
    }

    #[test]
    fn test_empty_record_set_still_renders_header() {
        let bytes = PdfExporter::default().to_bytes(&[], &[Column::Recipient]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let err = PdfExporter::default().to_bytes(&[record(1)], &[]).unwrap_err();
        assert!(matches!(err, Error::EmptyColumnSelection));
    }

    #[test]
    fn test_layout_spans_table_width() {
        let layout = TableLayout::new(&columns(), 700);
        assert_eq!(layout.widths.iter().sum::<i64>(), 700);
        assert_eq!(layout.lefts[0], MARGIN);
    }

    #[test]
    fn test_fit_text() {
        assert_eq!(fit_text("Rossi", 100, FONT_SIZE), "Rossi");
        let shortened = fit_text("Una ragione sociale davvero molto lunga", 46, FONT_SIZE);
        assert_eq!(shortened.chars().count(), 10);
        assert!(shortened.ends_with('…'));
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Caffè €5"), vec![b'C', b'a', b'f', b'f', 0xe8, b' ', 0x80, b'5']);
        assert_eq!(win_ansi("日"), vec![b'?']);
    }
}
