//! Bonifici Core Library
//!
//! Extraction, aggregation and export of credit-transfer batch files.
//!
//! # Supported Dialects
//!
//! - **ISO 20022**: `pain.001.001.03` customer credit transfer initiation
//! - **CBI**: Italian `CBIPaymentRequest.00.04.01`
//!
//! # Features
//!
//! - Sniff the dialect of a batch from its root namespace
//! - Merge several batches into one record table, keeping per-file errors
//! - Structural IBAN check
//! - Exact decimal totals, per-recipient, per-originator and monthly breakdowns
//! - Export a column projection as CSV or as a PDF table
//!
//! # Examples
//!
//! ## Merging uploaded batches
//!
//! ```no_run
//! use bonifici_core::normalize::{ingest, Upload};
//! use bonifici_core::aggregate::totals;
//!
//! let uploads = vec![
//!     Upload::new("gennaio.xml", std::fs::read("gennaio.xml")?),
//!     Upload::new("febbraio.xml", std::fs::read("febbraio.xml")?),
//! ];
//! let dataset = ingest(&uploads);
//! for failure in &dataset.failures {
//!     eprintln!("{}", failure);
//! }
//! let summary = totals(&dataset.records);
//! println!("{} transfers, total {}", summary.count, summary.sum);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Exporting a projection
//!
//! ```no_run
//! use bonifici_core::export::{export, ExportFormat, ExportRequest};
//! use bonifici_core::types::Column;
//!
//! # let records: Vec<bonifici_core::TransferRecord> = Vec::new();
//! let request = ExportRequest::new(ExportFormat::Pdf)
//!     .with_columns(vec![Column::Recipient, Column::Iban, Column::Amount]);
//! let output = export(&records, &request)?;
//! std::fs::write(&output.file_name, &output.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod dialect;
mod payment_xml;
pub mod iso20022_format;
pub mod cbi_format;
pub mod normalize;
pub mod iban;
pub mod aggregate;
pub mod csv_format;
pub mod pdf_format;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{BatchId, Column, TransferRecord};
pub use dialect::{detect_dialect, parse_batch, BatchParser, Dialect, ParsedBatch};
pub use normalize::{ingest, normalize, MergedDataset, Upload};
pub use iban::{annotate_ibans, validate_iban};
pub use export::{export, ExportFormat, ExportOutput, ExportRequest};
