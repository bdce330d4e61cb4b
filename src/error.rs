//! Error types for the bonifici-core library.

use crate::dialect::Dialect;
use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during parsing, aggregation and export.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error writing or re-reading CSV.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// The input is not well-formed XML.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The input bytes are not valid UTF-8.
    #[error("Invalid UTF-8 input: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The root element namespace matches no supported dialect.
    #[error("Unknown dialect: root namespace '{namespace}' is not supported")]
    UnknownDialect { namespace: String },

    /// The document belongs to another dialect than the one requested.
    #[error("Dialect mismatch: expected {expected} document, found {found}")]
    DialectMismatch { expected: Dialect, found: Dialect },

    /// A required element is missing or carries unusable content.
    #[error("Malformed batch at {path}: {reason}")]
    MalformedBatch { path: String, reason: String },

    /// No display or export column was selected.
    #[error("No column selected")]
    EmptyColumnSelection,

    /// Column name not recognised.
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Invalid format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Error building the PDF document.
    #[error("PDF error: {0}")]
    PdfError(String),
}

impl Error {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedBatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True when the error describes the batch content rather than the environment.
    pub fn is_malformed_batch(&self) -> bool {
        matches!(self, Error::MalformedBatch { .. })
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfError(err.to_string())
    }
}
