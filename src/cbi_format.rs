//! CBI payment request (`CBIPaymentRequest.00.04.01`) parser.
//!
//! The Italian interbank dialect drops the `Document/CstmrCdtTrfInitn`
//! wrapper: `GrpHdr` and `PmtInf` sit directly under the root. The requested
//! execution date may be given per payment block or per transaction.

use crate::dialect::{ensure_dialect, BatchParser, Dialect, ParsedBatch};
use crate::error::Result;
use crate::payment_xml::PaymentInitiationXml;
use std::io::Read;

/// Parser for CBI payment request documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CbiParser;

impl CbiParser {
    /// Parse a CBI payment request from any source implementing `Read`.
    pub fn from_read<R: Read>(&self, reader: &mut R) -> Result<ParsedBatch> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        self.parse(&content)
    }
}

impl BatchParser for CbiParser {
    fn dialect(&self) -> Dialect {
        Dialect::Cbi
    }

    fn parse_str(&self, xml: &str) -> Result<ParsedBatch> {
        ensure_dialect(xml, Dialect::Cbi)?;
        let request: PaymentInitiationXml = quick_xml::de::from_str(xml)?;
        request.into_batch(Dialect::Cbi, "CBIPaymentRequest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CBIPaymentRequest xmlns="urn:CBI:xsd:CBIPaymentRequest.00.04.01">
  <GrpHdr>
    <MsgId>CBI-0042</MsgId>
    <CreDtTm>2024-04-02T10:00:00</CreDtTm>
    <NbOfTxs>3</NbOfTxs>
    <CtrlSum>1600.00</CtrlSum>
    <InitgPty>
      <Nm>Ferri Logistica S.p.A.</Nm>
      <Id><OrgId><Othr><Id>0123456A</Id><Issr>CBI</Issr></Othr></OrgId></Id>
    </InitgPty>
  </GrpHdr>
  <PmtInf>
    <PmtInfId>1</PmtInfId>
    <PmtMtd>TRF</PmtMtd>
    <ReqdExctnDt><Dt>2024-04-10</Dt></ReqdExctnDt>
    <Dbtr><Nm>Ferri Logistica S.p.A.</Nm></Dbtr>
    <CdtTrfTxInf>
      <PmtId><InstrId>1</InstrId><EndToEndId>A1</EndToEndId></PmtId>
      <Amt><InstdAmt Ccy="EUR">1000.00</InstdAmt></Amt>
      <Cdtr><Nm>Trasporti Neri</Nm></Cdtr>
      <CdtrAcct><Id><IBAN>IT60X0542811101000000123456</IBAN></Id></CdtrAcct>
      <RmtInf><Ustrd>Saldo fattura 88</Ustrd></RmtInf>
    </CdtTrfTxInf>
    <CdtTrfTxInf>
      <PmtId><InstrId>2</InstrId><EndToEndId>A2</EndToEndId></PmtId>
      <ReqdExctnDt><Dt>2024-04-15</Dt></ReqdExctnDt>
      <Amt><InstdAmt Ccy="EUR">400.00</InstdAmt></Amt>
      <Cdtr><Nm>Gialli Carburanti</Nm></Cdtr>
      <CdtrAcct><Id><IBAN>IT 60 X054 2811 1010 0000 0123 456</IBAN></Id></CdtrAcct>
      <RmtInf><Ustrd>Acconto</Ustrd><Ustrd>aprile</Ustrd></RmtInf>
    </CdtTrfTxInf>
    <CdtTrfTxInf>
      <PmtId><InstrId>3</InstrId><EndToEndId>A3</EndToEndId></PmtId>
      <Amt><InstdAmt Ccy="EUR">200.00</InstdAmt></Amt>
      <Cdtr><Nm>Trasporti Neri</Nm></Cdtr>
      <CdtrAcct><Id><IBAN>IT60X0542811101000000123456</IBAN></Id></CdtrAcct>
    </CdtTrfTxInf>
  </PmtInf>
</CBIPaymentRequest>"#;

    #[test]
    fn test_parse_request() {
        let batch = CbiParser.parse(REQUEST.as_bytes()).unwrap();

        assert_eq!(batch.dialect, Dialect::Cbi);
        assert_eq!(batch.originator, "Ferri Logistica S.p.A.");
        assert_eq!(batch.records.len(), 3);

        let amounts: Vec<Decimal> = batch.records.iter().map(|r| r.amount).collect();
        assert_eq!(
            amounts,
            vec![
                Decimal::from_str("1000.00").unwrap(),
                Decimal::from_str("400.00").unwrap(),
                Decimal::from_str("200.00").unwrap(),
            ]
        );
        assert!(batch
            .records
            .iter()
            .all(|r| r.originator_name == "Ferri Logistica S.p.A."));
    }

    #[test]
    fn test_transaction_date_overrides_block_date() {
        let batch = CbiParser.parse_str(REQUEST).unwrap();
        assert_eq!(batch.records[0].execution_date, "2024-04-10");
        assert_eq!(batch.records[1].execution_date, "2024-04-15");
        assert_eq!(batch.records[2].execution_date, "2024-04-10");
    }

    #[test]
    fn test_iban_kept_verbatim_and_remittance_joined() {
        let batch = CbiParser.parse_str(REQUEST).unwrap();
        assert_eq!(batch.records[1].recipient_iban, "IT 60 X054 2811 1010 0000 0123 456");
        assert_eq!(batch.records[1].remittance_info, "Acconto aprile");
    }

    #[test]
    fn test_missing_recipient_name() {
        let xml = r#"<CBIPaymentRequest xmlns="urn:CBI:xsd:CBIPaymentRequest.00.04.01">
  <GrpHdr><InitgPty><Nm>Ferri</Nm></InitgPty></GrpHdr>
  <PmtInf>
    <CdtTrfTxInf>
      <Amt><InstdAmt Ccy="EUR">5.00</InstdAmt></Amt>
      <CdtrAcct><Id><IBAN>IT60X0542811101000000123456</IBAN></Id></CdtrAcct>
    </CdtTrfTxInf>
  </PmtInf>
</CBIPaymentRequest>"#;

        match CbiParser.parse_str(xml) {
            Err(Error::MalformedBatch { path, reason }) => {
                assert_eq!(path, "CBIPaymentRequest/PmtInf[1]/CdtTrfTxInf[1]/Cdtr/Nm");
                assert_eq!(reason, "missing required element");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_request_without_transfers() {
        let xml = r#"<CBIPaymentRequest xmlns="urn:CBI:xsd:CBIPaymentRequest.00.04.01">
  <GrpHdr><InitgPty><Nm>Ferri</Nm></InitgPty></GrpHdr>
</CBIPaymentRequest>"#;

        let batch = CbiParser.parse_str(xml).unwrap();
        assert_eq!(batch.originator, "Ferri");
        assert!(batch.records.is_empty());
    }

    #[test]
    fn test_rejects_pain001_document() {
        let xml = r#"<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.001.001.03">
  <CstmrCdtTrfInitn>
    <GrpHdr><InitgPty><Nm>Rossi</Nm></InitgPty></GrpHdr>
    <PmtInf>
      <CdtTrfTxInf>
        <Amt><InstdAmt Ccy="EUR">5.00</InstdAmt></Amt>
        <Cdtr><Nm>Uno</Nm></Cdtr>
        <CdtrAcct><Id><IBAN>IT60X0542811101000000123456</IBAN></Id></CdtrAcct>
      </CdtTrfTxInf>
    </PmtInf>
  </CstmrCdtTrfInitn>
</Document>"#;

        match CbiParser.parse(xml.as_bytes()) {
            Err(Error::DialectMismatch { expected, found }) => {
                assert_eq!(expected, Dialect::Cbi);
                assert_eq!(found, Dialect::Iso20022);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
