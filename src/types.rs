//! Common types shared by the dialect parsers, the aggregator and the exporters.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Originator placeholder used when a batch carries no `InitgPty/Nm`.
pub const UNKNOWN_ORIGINATOR: &str = "SOCIETÀ NON TROVATA";

/// Label carried by the recipient cell of the display total row.
pub const TOTAL_LABEL: &str = "TOTALE";

/// Identity of one uploaded batch: its position in the upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub usize);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One credit transfer instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Requested execution date as found in the file, empty when absent.
    pub execution_date: String,

    /// Creditor name.
    pub recipient_name: String,

    /// Creditor IBAN, verbatim.
    pub recipient_iban: String,

    /// Instructed amount.
    pub amount: Decimal,

    /// Unstructured remittance information, empty when absent.
    pub remittance_info: String,

    /// Ordering company of the batch this record came from.
    pub originator_name: String,

    /// Source batch, set by the normalizer.
    pub batch: Option<BatchId>,

    /// Structural IBAN check result, set by the validator.
    pub iban_valid: Option<bool>,
}

impl TransferRecord {
    /// Execution date as a calendar day, if it can be read.
    ///
    /// Accepts `YYYY-MM-DD` as well as ISO date-times, which are truncated.
    pub fn execution_day(&self) -> Option<NaiveDate> {
        parse_execution_date(&self.execution_date)
    }
}

/// Parse an execution date string leniently; `None` for empty or unreadable input.
pub fn parse_execution_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    // ISO 8601 with time: 2024-03-01T10:15:00
    value
        .get(..10)
        .filter(|_| value.as_bytes().get(10) == Some(&b'T'))
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// Render an amount with exactly two decimals, `.` as separator.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// A projectable column of the record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Execution date.
    Date,
    /// Recipient name.
    Recipient,
    /// Recipient IBAN.
    Iban,
    /// Amount.
    Amount,
    /// Remittance information.
    Remittance,
    /// Originator name.
    Originator,
    /// IBAN validity flag.
    IbanValid,
}

impl Column {
    /// Every column in table order.
    pub const ALL: [Column; 7] = [
        Column::Date,
        Column::Recipient,
        Column::Iban,
        Column::Amount,
        Column::Remittance,
        Column::Originator,
        Column::IbanValid,
    ];

    /// Columns shown before the user changes anything: all parsed fields except the originator.
    pub fn default_selection() -> Vec<Column> {
        vec![
            Column::Date,
            Column::Recipient,
            Column::Iban,
            Column::Amount,
            Column::Remittance,
        ]
    }

    /// Header label used in tables and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Column::Date => "Data",
            Column::Recipient => "Destinatario",
            Column::Iban => "IBAN",
            Column::Amount => "Importo",
            Column::Remittance => "Causale",
            Column::Originator => "Società Ordinante",
            Column::IbanValid => "IBAN Valido",
        }
    }

    /// Cell text for `record` in this column.
    pub fn render(&self, record: &TransferRecord) -> String {
        match self {
            Column::Date => record.execution_date.clone(),
            Column::Recipient => record.recipient_name.clone(),
            Column::Iban => record.recipient_iban.clone(),
            Column::Amount => format_amount(record.amount),
            Column::Remittance => record.remittance_info.clone(),
            Column::Originator => record.originator_name.clone(),
            Column::IbanValid => match record.iban_valid {
                Some(true) => "true".to_string(),
                Some(false) => "false".to_string(),
                None => String::new(),
            },
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" | "execution_date" | "data" => Ok(Column::Date),
            "recipient" | "recipient_name" | "destinatario" => Ok(Column::Recipient),
            "iban" | "recipient_iban" => Ok(Column::Iban),
            "amount" | "importo" => Ok(Column::Amount),
            "remittance" | "remittance_info" | "causale" => Ok(Column::Remittance),
            "originator" | "originator_name" | "società ordinante" | "societa ordinante" => {
                Ok(Column::Originator)
            }
            "iban_valid" | "iban valido" => Ok(Column::IbanValid),
            _ => Err(Error::InvalidColumn(s.to_string())),
        }
    }
}

/// Fail with [`Error::EmptyColumnSelection`] when nothing is selected.
pub fn ensure_columns(columns: &[Column]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::EmptyColumnSelection);
    }
    Ok(())
}
