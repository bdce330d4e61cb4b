//! Structural IBAN check for Italian accounts.
//!
//! Only length and country prefix are verified; the mod-97 checksum is not.

use crate::types::TransferRecord;

/// Length of an Italian IBAN.
pub const IT_IBAN_LENGTH: usize = 27;

/// Country prefix accepted by [`validate_iban`].
pub const IT_COUNTRY_CODE: &str = "IT";

/// True when `iban`, ignoring spaces and case, is 27 characters starting with `IT`.
pub fn validate_iban(iban: &str) -> bool {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    compact.chars().count() == IT_IBAN_LENGTH && compact.starts_with(IT_COUNTRY_CODE)
}

/// Copy of `records` with `iban_valid` filled in.
pub fn annotate_ibans(records: &[TransferRecord]) -> Vec<TransferRecord> {
    let annotated: Vec<TransferRecord> = records
        .iter()
        .map(|record| TransferRecord {
            iban_valid: Some(validate_iban(&record.recipient_iban)),
            ..record.clone()
        })
        .collect();

    let invalid = annotated
        .iter()
        .filter(|r| r.iban_valid == Some(false))
        .count();
    if invalid > 0 {
        tracing::info!("{} of {} IBANs failed the structural check", invalid, annotated.len());
    }

    annotated
}
