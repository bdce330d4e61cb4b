//! ISO 20022 pain.001.001.03 customer credit transfer initiation parser.
//!
//! The batch lives under `Document/CstmrCdtTrfInitn`: the group header names
//! the initiating party, each `PmtInf` block carries the requested execution
//! date and the `CdtTrfTxInf` transfers.

use crate::dialect::{ensure_dialect, BatchParser, Dialect, ParsedBatch};
use crate::error::Result;
use crate::payment_xml::PaymentInitiationXml;
use serde::Deserialize;
use std::io::Read;

/// Parser for pain.001.001.03 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso20022Parser;

impl Iso20022Parser {
    /// Parse a pain.001 document from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use bonifici_core::iso20022_format::Iso20022Parser;
    ///
    /// let mut file = File::open("bonifici.xml")?;
    /// let batch = Iso20022Parser.from_read(&mut file)?;
    /// println!("{}: {} transfers", batch.originator, batch.records.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(&self, reader: &mut R) -> Result<ParsedBatch> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        self.parse(&content)
    }
}

impl BatchParser for Iso20022Parser {
    fn dialect(&self) -> Dialect {
        Dialect::Iso20022
    }

    fn parse_str(&self, xml: &str) -> Result<ParsedBatch> {
        ensure_dialect(xml, Dialect::Iso20022)?;
        let document: DocumentXml = quick_xml::de::from_str(xml)?;

        let initiation = document.cstmr_cdt_trf_initn.unwrap_or_else(|| {
            tracing::warn!("pain.001 document without CstmrCdtTrfInitn, no transfers read");
            PaymentInitiationXml::default()
        });

        initiation.into_batch(Dialect::Iso20022, "CstmrCdtTrfInitn")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Document")]
struct DocumentXml {
    #[serde(rename = "CstmrCdtTrfInitn")]
    cstmr_cdt_trf_initn: Option<PaymentInitiationXml>,
}
