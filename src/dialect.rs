//! Dialect selection and the common parser capability.
//!
//! A batch file is routed to a parser by the namespace URI of its root
//! element. Both parsers produce the same [`ParsedBatch`] shape.

use crate::cbi_format::CbiParser;
use crate::error::{Error, Result};
use crate::iso20022_format::Iso20022Parser;
use crate::types::TransferRecord;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root namespace of ISO 20022 customer credit transfer initiations.
pub const ISO20022_NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";

/// Root namespace of CBI payment requests.
pub const CBI_NAMESPACE: &str = "urn:CBI:xsd:CBIPaymentRequest.00.04.01";

/// Supported XML batch dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// ISO 20022 pain.001.001.03
    Iso20022,
    /// Italian CBI payment request
    Cbi,
}

impl Dialect {
    /// Dialect owning `namespace`, if any.
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace.trim() {
            ISO20022_NAMESPACE => Some(Dialect::Iso20022),
            CBI_NAMESPACE => Some(Dialect::Cbi),
            _ => None,
        }
    }

    /// Root namespace URI of this dialect.
    pub fn namespace(&self) -> &'static str {
        match self {
            Dialect::Iso20022 => ISO20022_NAMESPACE,
            Dialect::Cbi => CBI_NAMESPACE,
        }
    }

    /// Parser implementing this dialect.
    pub fn parser(&self) -> &'static dyn BatchParser {
        match self {
            Dialect::Iso20022 => &Iso20022Parser,
            Dialect::Cbi => &CbiParser,
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "iso20022" | "iso" | "pain.001" | "pain001" | "sepa" => Ok(Dialect::Iso20022),
            "cbi" => Ok(Dialect::Cbi),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Iso20022 => f.write_str("ISO 20022"),
            Dialect::Cbi => f.write_str("CBI"),
        }
    }
}

/// Records and originator extracted from one batch document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    /// Dialect the document was read as.
    pub dialect: Dialect,
    /// Ordering company, or the placeholder when absent.
    pub originator: String,
    /// Transfers in document order.
    pub records: Vec<TransferRecord>,
}

/// Turns one XML batch document into canonical transfer records.
pub trait BatchParser {
    /// Dialect handled by this parser.
    fn dialect(&self) -> Dialect;

    /// Parse an already decoded document.
    fn parse_str(&self, xml: &str) -> Result<ParsedBatch>;

    /// Parse raw UTF-8 bytes (a leading byte-order mark is ignored).
    fn parse(&self, bytes: &[u8]) -> Result<ParsedBatch> {
        self.parse_str(decode_utf8(bytes)?)
    }
}

/// Decode a UTF-8 document, dropping a leading byte-order mark.
pub fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

/// Identify the dialect from the namespace URI of the root element.
pub fn detect_dialect(xml: &str) -> Result<Dialect> {
    let mut reader = NsReader::from_str(xml);

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(_)) | (ns, Event::Empty(_)) => {
                let namespace = match ns {
                    ResolveResult::Bound(Namespace(uri)) => {
                        String::from_utf8_lossy(uri).into_owned()
                    }
                    _ => String::new(),
                };
                return Dialect::from_namespace(&namespace)
                    .ok_or(Error::UnknownDialect { namespace });
            }
            (_, Event::Eof) => {
                return Err(Error::XmlError("document has no root element".to_string()));
            }
            _ => {}
        }
    }
}

/// Fail unless the root namespace of `xml` belongs to `expected`.
pub fn ensure_dialect(xml: &str, expected: Dialect) -> Result<()> {
    let found = detect_dialect(xml)?;
    if found != expected {
        return Err(Error::DialectMismatch { expected, found });
    }
    Ok(())
}

/// Parse one batch, sniffing the dialect unless one is forced.
pub fn parse_batch(bytes: &[u8], dialect: Option<Dialect>) -> Result<ParsedBatch> {
    let xml = decode_utf8(bytes)?;
    let dialect = match dialect {
        Some(dialect) => dialect,
        None => detect_dialect(xml)?,
    };

    tracing::debug!("Parsing {} batch ({} bytes)", dialect, bytes.len());
    dialect.parser().parse_str(xml)
}
