//! Element model shared by the pain.001 and CBI payment request dialects.
//!
//! Both schemas describe a batch as a group header followed by one or more
//! payment information blocks, each holding the individual credit transfers.
//! Every element is optional at this level; required-ness is enforced while
//! walking the tree so errors can name the offending element path.

use crate::dialect::{Dialect, ParsedBatch};
use crate::error::{Error, Result};
use crate::types::{TransferRecord, UNKNOWN_ORIGINATOR};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaymentInitiationXml {
    #[serde(rename = "GrpHdr")]
    grp_hdr: Option<GroupHeaderXml>,
    #[serde(rename = "PmtInf", default)]
    pmt_inf: Vec<PaymentInformationXml>,
}

#[derive(Debug, Deserialize)]
struct GroupHeaderXml {
    #[serde(rename = "InitgPty")]
    initg_pty: Option<PartyXml>,
}

#[derive(Debug, Deserialize)]
struct PartyXml {
    #[serde(rename = "Nm")]
    nm: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentInformationXml {
    #[serde(rename = "ReqdExctnDt")]
    reqd_exctn_dt: Option<ExecutionDateXml>,
    #[serde(rename = "CdtTrfTxInf", default)]
    cdt_trf_tx_inf: Vec<CreditTransferXml>,
}

/// `ReqdExctnDt` is a bare date in pain.001.001.03 and wraps `Dt`/`DtTm` elsewhere.
#[derive(Debug, Deserialize)]
struct ExecutionDateXml {
    #[serde(rename = "$text")]
    text: Option<String>,
    #[serde(rename = "Dt")]
    dt: Option<String>,
    #[serde(rename = "DtTm")]
    dt_tm: Option<String>,
}

impl ExecutionDateXml {
    fn value(&self) -> Option<String> {
        [&self.dt, &self.dt_tm, &self.text]
            .into_iter()
            .flatten()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct CreditTransferXml {
    #[serde(rename = "Amt")]
    amt: Option<AmountXml>,
    #[serde(rename = "Cdtr")]
    cdtr: Option<PartyXml>,
    #[serde(rename = "CdtrAcct")]
    cdtr_acct: Option<AccountXml>,
    #[serde(rename = "RmtInf")]
    rmt_inf: Option<RemittanceInformationXml>,
    // CBI files sometimes carry the date per transaction
    #[serde(rename = "ReqdExctnDt")]
    reqd_exctn_dt: Option<ExecutionDateXml>,
}

#[derive(Debug, Deserialize)]
struct AmountXml {
    #[serde(rename = "InstdAmt")]
    instd_amt: Option<InstructedAmountXml>,
}

#[derive(Debug, Deserialize)]
struct InstructedAmountXml {
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountXml {
    #[serde(rename = "Id")]
    id: Option<AccountIdXml>,
}

#[derive(Debug, Deserialize)]
struct AccountIdXml {
    #[serde(rename = "IBAN")]
    iban: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemittanceInformationXml {
    #[serde(rename = "Ustrd", default)]
    ustrd: Vec<String>,
}

impl PaymentInitiationXml {
    /// Walk the tree into canonical records.
    ///
    /// `root` is the element path prefix used in error messages.
    pub(crate) fn into_batch(self, dialect: Dialect, root: &str) -> Result<ParsedBatch> {
        let originator = self
            .grp_hdr
            .and_then(|hdr| hdr.initg_pty)
            .and_then(|pty| pty.nm)
            .map(|nm| nm.trim().to_string())
            .filter(|nm| !nm.is_empty())
            .unwrap_or_else(|| UNKNOWN_ORIGINATOR.to_string());

        let mut records = Vec::new();

        for (block_idx, block) in self.pmt_inf.into_iter().enumerate() {
            let block_date = block
                .reqd_exctn_dt
                .as_ref()
                .and_then(ExecutionDateXml::value)
                .unwrap_or_default();

            for (tx_idx, tx) in block.cdt_trf_tx_inf.into_iter().enumerate() {
                let path = format!(
                    "{}/PmtInf[{}]/CdtTrfTxInf[{}]",
                    root,
                    block_idx + 1,
                    tx_idx + 1
                );
                records.push(tx.into_record(&path, &block_date, &originator)?);
            }
        }

        Ok(ParsedBatch {
            dialect,
            originator,
            records,
        })
    }
}

impl CreditTransferXml {
    fn into_record(self, path: &str, block_date: &str, originator: &str) -> Result<TransferRecord> {
        let recipient_name = self
            .cdtr
            .and_then(|c| c.nm)
            .ok_or_else(|| missing(path, "Cdtr/Nm"))?;

        let recipient_iban = self
            .cdtr_acct
            .and_then(|a| a.id)
            .and_then(|id| id.iban)
            .ok_or_else(|| missing(path, "CdtrAcct/Id/IBAN"))?;

        let raw_amount = self
            .amt
            .and_then(|a| a.instd_amt)
            .ok_or_else(|| missing(path, "Amt/InstdAmt"))?
            .value
            .unwrap_or_default();
        let amount = parse_amount(&raw_amount, &format!("{}/Amt/InstdAmt", path))?;

        let remittance_info = self
            .rmt_inf
            .map(|r| {
                r.ustrd
                    .iter()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let execution_date = self
            .reqd_exctn_dt
            .as_ref()
            .and_then(ExecutionDateXml::value)
            .unwrap_or_else(|| block_date.to_string());

        Ok(TransferRecord {
            execution_date,
            recipient_name,
            recipient_iban,
            amount,
            remittance_info,
            originator_name: originator.to_string(),
            batch: None,
            iban_valid: None,
        })
    }
}

fn missing(path: &str, element: &str) -> Error {
    Error::malformed(format!("{}/{}", path, element), "missing required element")
}

/// Parse an instructed amount, accepting `.` or `,` as decimal separator.
/// Digit limits of an `InstdAmt` value (`ActiveOrHistoricCurrencyAndAmount`).
const MAX_TOTAL_DIGITS: usize = 18;
const MAX_FRACTION_DIGITS: u32 = 5;

pub(crate) fn parse_amount(raw: &str, path: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace(',', ".");

    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| Error::malformed(path, format!("invalid amount '{}'", raw.trim())))?;

    if amount < Decimal::ZERO {
        return Err(Error::malformed(
            path,
            format!("negative amount '{}'", raw.trim()),
        ));
    }

    let normalized = amount.normalize();
    if normalized.scale() > MAX_FRACTION_DIGITS
        || normalized.mantissa().unsigned_abs().to_string().len() > MAX_TOTAL_DIGITS
    {
        return Err(Error::malformed(
            path,
            format!(
                "amount '{}' exceeds {} digits with at most {} decimals",
                raw.trim(),
                MAX_TOTAL_DIGITS,
                MAX_FRACTION_DIGITS
            ),
        ));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_separators() {
        let dot = parse_amount("1540.25", "Amt").unwrap();
        let comma = parse_amount(" 1540,25 ", "Amt").unwrap();
        assert_eq!(dot, comma);
        assert_eq!(dot.to_string(), "1540.25");
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        let err = parse_amount("dieci euro", "Doc/Amt/InstdAmt").unwrap_err();
        match err {
            Error::MalformedBatch { path, reason } => {
                assert_eq!(path, "Doc/Amt/InstdAmt");
                assert!(reason.contains("dieci euro"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse_amount("", "Amt").unwrap_err().is_malformed_batch());
        assert!(parse_amount("-5.00", "Amt").unwrap_err().is_malformed_batch());
    }

    #[test]
    fn test_parse_amount_digit_limits() {
        let widest = parse_amount("1234567890123,12345", "Amt").unwrap();
        assert_eq!(widest.to_string(), "1234567890123.12345");
        assert_eq!(parse_amount("999999999999999999", "Amt").unwrap().to_string(), "999999999999999999");
        assert_eq!(parse_amount("1540.250000", "Amt").unwrap().to_string(), "1540.250000");

        let err = parse_amount("79228162514264337593543950335", "Doc/Amt/InstdAmt").unwrap_err();
        match err {
            Error::MalformedBatch { path, reason } => {
                assert_eq!(path, "Doc/Amt/InstdAmt");
                assert!(reason.contains("exceeds 18 digits"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_amount("1000000000000000000", "Amt").unwrap_err().is_malformed_batch());
        assert!(parse_amount("0.123456", "Amt").unwrap_err().is_malformed_batch());
    }

    #[test]
    fn test_execution_date_shapes() {
        let bare = ExecutionDateXml {
            text: Some(" 2024-02-01 ".into()),
            dt: None,
            dt_tm: None,
        };
        assert_eq!(bare.value().as_deref(), Some("2024-02-01"));

        let wrapped = ExecutionDateXml {
            text: None,
            dt: Some("2024-02-02".into()),
            dt_tm: None,
        };
        assert_eq!(wrapped.value().as_deref(), Some("2024-02-02"));

        let empty = ExecutionDateXml {
            text: Some("  ".into()),
            dt: None,
            dt_tm: None,
        };
        assert!(empty.value().is_none());
    }
}
