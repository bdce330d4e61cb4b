//! Export requests from the presentation layer.

use crate::csv_format::{CsvExporter, CsvOptions};
use crate::error::{Error, Result};
use crate::pdf_format::{PdfExporter, PdfOptions};
use crate::types::{ensure_columns, Column, TransferRecord};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Base name of suggested export files.
pub const EXPORT_FILE_STEM: &str = "bonifici_combinati";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Comma/semicolon separated values
    Csv,
    /// Paginated PDF table
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl ExportFormat {
    /// Get file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// MIME type of the produced bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Suggested download name.
    pub fn file_name(&self) -> String {
        format!("{}.{}", EXPORT_FILE_STEM, self.extension())
    }
}

/// What to export and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Columns in output order.
    pub columns: Vec<Column>,
    #[serde(default)]
    pub csv: CsvOptions,
    #[serde(default)]
    pub pdf: PdfOptions,
}

impl ExportRequest {
    /// Request for `format` with the default column selection.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            columns: Column::default_selection(),
            csv: CsvOptions::default(),
            pdf: PdfOptions::default(),
        }
    }

    /// Replace the column selection.
    pub fn with_columns(mut self, columns: impl Into<Vec<Column>>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Replace the CSV writer settings.
    pub fn with_csv_options(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Replace the PDF layout settings.
    pub fn with_pdf_options(mut self, pdf: PdfOptions) -> Self {
        self.pdf = pdf;
        self
    }
}

/// Export result ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Serialize `records` as `request` describes.
pub fn export(records: &[TransferRecord], request: &ExportRequest) -> Result<ExportOutput> {
    ensure_columns(&request.columns)?;

    let bytes = match request.format {
        ExportFormat::Csv => CsvExporter::new(request.csv).to_bytes(records, &request.columns)?,
        ExportFormat::Pdf => {
            PdfExporter::new(request.pdf.clone()).to_bytes(records, &request.columns)?
        }
    };

    tracing::info!(
        "Exported {} records as {} ({} bytes)",
        records.len(),
        request.format.extension(),
        bytes.len()
    );

    Ok(ExportOutput {
        bytes,
        file_name: request.format.file_name(),
        mime_type: request.format.mime_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn records() -> Vec<TransferRecord> {
        vec![TransferRecord {
            execution_date: "2024-07-01".into(),
            recipient_name: "Rossi".into(),
            recipient_iban: "IT60X0542811101000000123456".into(),
            amount: Decimal::new(10050, 2),
            remittance_info: "Nota".into(),
            originator_name: "ACME".into(),
            batch: None,
            iban_valid: None,
        }]
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_export_metadata() {
        let output = export(&records(), &ExportRequest::new(ExportFormat::Csv)).unwrap();
        assert_eq!(output.file_name, "bonifici_combinati.csv");
        assert_eq!(output.mime_type, "text/csv");
        assert_eq!(
            String::from_utf8(output.bytes).unwrap(),
            "Data,Destinatario,IBAN,Importo,Causale\n2024-07-01,Rossi,IT60X0542811101000000123456,100.50,Nota\n"
        );
    }

    #[test]
    fn test_pdf_export_metadata() {
        let output = export(&records(), &ExportRequest::new(ExportFormat::Pdf)).unwrap();
        assert_eq!(output.file_name, "bonifici_combinati.pdf");
        assert_eq!(output.mime_type, "application/pdf");
        assert!(output.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_column_selection() {
        for format in [ExportFormat::Csv, ExportFormat::Pdf] {
            let request = ExportRequest::new(format).with_columns(Vec::<Column>::new());
            assert!(matches!(
                export(&records(), &request),
                Err(Error::EmptyColumnSelection)
            ));
        }
    }
}
