//! Filtering and statistics over a merged record sequence.
//!
//! Every function here borrows its input and returns new values; amounts are
//! summed as exact decimals unless [`SummationMode::BinaryFloat`] is asked for.

use crate::error::Result;
use crate::types::{ensure_columns, format_amount, BatchId, Column, TransferRecord, TOTAL_LABEL};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conjunctive record predicates; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Inclusive lower amount bound.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper amount bound.
    pub max_amount: Option<Decimal>,
    /// Inclusive execution date range. Records without a readable date never match.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Case-insensitive substring of the recipient name.
    pub recipient_contains: Option<String>,
}

impl RecordFilter {
    /// True when `record` satisfies every set predicate.
    pub fn matches(&self, record: &TransferRecord) -> bool {
        if let Some(min) = self.min_amount {
            if record.amount < min {
                return false;
            }
        }

        if let Some(max) = self.max_amount {
            if record.amount > max {
                return false;
            }
        }

        if let Some((from, to)) = self.date_range {
            match record.execution_day() {
                Some(day) if day >= from && day <= to => {}
                _ => return false,
            }
        }

        if let Some(ref needle) = self.recipient_contains {
            if !record
                .recipient_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        true
    }

    /// Matching records, in input order.
    pub fn apply(&self, records: &[TransferRecord]) -> Vec<TransferRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Subsequence of `records` matching every given predicate.
pub fn filter(
    records: &[TransferRecord],
    min_amount: Option<Decimal>,
    max_amount: Option<Decimal>,
    date_range: Option<(NaiveDate, NaiveDate)>,
    recipient_substring: Option<&str>,
) -> Vec<TransferRecord> {
    RecordFilter {
        min_amount,
        max_amount,
        date_range,
        recipient_contains: recipient_substring.map(str::to_string),
    }
    .apply(records)
}

/// Record count and amount sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,
    pub sum: Decimal,
}

impl Totals {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.sum += amount;
    }
}

/// How amounts are accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummationMode {
    /// Exact decimal addition.
    #[default]
    Exact,
    /// IEEE-754 double accumulation, reproducing totals of float-based tools.
    BinaryFloat,
}

/// Count and exact sum of `records`.
pub fn totals(records: &[TransferRecord]) -> Totals {
    totals_with(records, SummationMode::Exact)
}

/// Count and sum of `records` accumulated as `mode` dictates.
pub fn totals_with(records: &[TransferRecord], mode: SummationMode) -> Totals {
    match mode {
        SummationMode::Exact => records.iter().fold(Totals::default(), |mut acc, r| {
            acc.add(r.amount);
            acc
        }),
        SummationMode::BinaryFloat => {
            let sum: f64 = records
                .iter()
                .map(|r| r.amount.to_f64().unwrap_or_default())
                .sum();
            Totals {
                count: records.len(),
                sum: Decimal::from_f64_retain(sum).unwrap_or_default(),
            }
        }
    }
}

/// Per-recipient transfer counts and mean amounts.
///
/// Means keep full decimal precision; round with
/// [`format_amount`] for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientBreakdown {
    pub counts: BTreeMap<String, usize>,
    pub means: BTreeMap<String, Decimal>,
}

/// Group by exact recipient name.
pub fn by_recipient(records: &[TransferRecord]) -> RecipientBreakdown {
    let mut grouped: BTreeMap<String, Totals> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.recipient_name.clone())
            .or_default()
            .add(record.amount);
    }

    let mut breakdown = RecipientBreakdown::default();
    for (name, group) in grouped {
        let mean = group.sum / Decimal::from(group.count);
        breakdown.counts.insert(name.clone(), group.count);
        breakdown.means.insert(name, mean);
    }
    breakdown
}

/// Count and sum per originator name.
pub fn by_originator(records: &[TransferRecord]) -> BTreeMap<String, Totals> {
    let mut grouped: BTreeMap<String, Totals> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.originator_name.clone())
            .or_default()
            .add(record.amount);
    }
    grouped
}

/// Count and sum per source batch; untagged records are skipped.
pub fn by_batch(records: &[TransferRecord]) -> BTreeMap<BatchId, Totals> {
    let mut grouped: BTreeMap<BatchId, Totals> = BTreeMap::new();
    for record in records {
        if let Some(id) = record.batch {
            grouped.entry(id).or_default().add(record.amount);
        }
    }
    grouped
}

/// Amount sum per `YYYY-MM`; records without a readable date are left out.
pub fn monthly_trend(records: &[TransferRecord]) -> BTreeMap<String, Decimal> {
    let mut trend: BTreeMap<String, Decimal> = BTreeMap::new();
    for record in records {
        if let Some(day) = record.execution_day() {
            *trend.entry(day.format("%Y-%m").to_string()).or_default() += record.amount;
        }
    }
    trend
}

/// Table ready for on-screen rendering.
///
/// Not accepted by the exporters: the total row only exists here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub total_row: Option<Vec<String>>,
}

/// Project `records` onto `columns` for display.
///
/// Rows are sorted by execution date when the date column is shown, and a
/// total row is appended when the amount column is shown.
pub fn display_projection(records: &[TransferRecord], columns: &[Column]) -> Result<DisplayTable> {
    ensure_columns(columns)?;

    let mut ordered: Vec<&TransferRecord> = records.iter().collect();
    if columns.contains(&Column::Date) {
        ordered.sort_by(|a, b| a.execution_date.cmp(&b.execution_date));
    }

    let rows = ordered
        .iter()
        .map(|record| columns.iter().map(|c| c.render(record)).collect())
        .collect();

    let total_row = columns.contains(&Column::Amount).then(|| {
        let sum = totals(records).sum;
        columns
            .iter()
            .map(|c| match c {
                Column::Recipient => TOTAL_LABEL.to_string(),
                Column::Amount => format_amount(sum),
                _ => String::new(),
            })
            .collect()
    });

    Ok(DisplayTable {
        columns: columns.to_vec(),
        rows,
        total_row,
    })
}
