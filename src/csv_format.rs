//! CSV export of a record projection.
//!
//! The header row carries the selected column labels in caller order;
//! amounts are written with two decimals and a `.` separator whatever the
//! chosen field delimiter.

use crate::error::{Error, Result};
use crate::types::{ensure_columns, Column, TransferRecord};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// UTF-8 byte-order mark, understood by spreadsheet tools as an encoding hint.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field delimiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    /// Byte handed to the CSV writer.
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
        }
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            _ => Err(Error::InvalidFormat(format!("unsupported CSV delimiter '{}'", s))),
        }
    }
}

/// CSV writer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    pub delimiter: Delimiter,
    /// Prefix the output with a UTF-8 byte-order mark.
    pub byte_order_mark: bool,
}

/// Writes records as CSV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvExporter {
    pub options: CsvOptions,
}

impl CsvExporter {
    /// Exporter writing with `options`.
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Write `records` projected onto `columns` to any destination implementing `Write`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use bonifici_core::csv_format::CsvExporter;
    /// use bonifici_core::types::Column;
    ///
    /// # let records: Vec<bonifici_core::TransferRecord> = Vec::new();
    /// let mut file = File::create("bonifici_combinati.csv")?;
    /// CsvExporter::default().write_to(&records, &Column::default_selection(), &mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to<W: Write>(
        &self,
        records: &[TransferRecord],
        columns: &[Column],
        writer: &mut W,
    ) -> Result<()> {
        ensure_columns(columns)?;

        if self.options.byte_order_mark {
            writer.write_all(UTF8_BOM)?;
        }

        let mut csv_writer = WriterBuilder::new()
            .delimiter(self.options.delimiter.as_byte())
            .from_writer(writer);

        csv_writer.write_record(columns.iter().map(Column::label))?;

        for record in records {
            csv_writer.write_record(columns.iter().map(|c| c.render(record)))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Same as [`CsvExporter::write_to`], collected into a buffer.
    pub fn to_bytes(&self, records: &[TransferRecord], columns: &[Column]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(records, columns, &mut buffer)?;
        Ok(buffer)
    }
}
