use crate::bban::validate_bban;
use crate::iban::{validate_iban_with, LengthPolicy};
use crate::models::{IdentifierRow, ValidationRow};
use crate::pan::validate_pan;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// Invalid rows per error kind.
    pub failures: BTreeMap<String, usize>,
}

impl BatchSummary {
    fn new() -> Self {
        Self {
            total_records: 0,
            valid_records: 0,
            invalid_records: 0,
            failures: BTreeMap::new(),
        }
    }

    fn record(&mut self, row: &ValidationRow) {
        self.total_records += 1;
        if row.valid {
            self.valid_records += 1;
            return;
        }
        self.invalid_records += 1;
        let kind = row.error.clone().unwrap_or_else(|| "unknown".to_string());
        *self.failures.entry(kind).or_insert(0) += 1;
    }
}

pub fn validate_csv(
    input: &Path,
    output: &Path,
    policy: LengthPolicy,
) -> Result<BatchSummary, String> {
    let reader = std::fs::File::open(input).map_err(|err| err.to_string())?;
    let writer = std::fs::File::create(output).map_err(|err| err.to_string())?;
    validate_stream(reader, writer, policy)
}

/// Validates every `kind,value,country` row from `input` and writes one
/// result row per input to `output`. Inputs are always normalized.
pub fn validate_stream<R: Read, W: Write>(
    input: R,
    output: W,
    policy: LengthPolicy,
) -> Result<BatchSummary, String> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::new();

    for result in reader.deserialize() {
        let row: IdentifierRow = result.map_err(|err| err.to_string())?;
        let validated = validate_row(&row, policy);
        summary.record(&validated);
        writer.serialize(&validated).map_err(|err| err.to_string())?;
    }
    writer.flush().map_err(|err| err.to_string())?;

    log::debug!(
        "batch validated {} rows ({} invalid)",
        summary.total_records,
        summary.invalid_records
    );
    Ok(summary)
}

pub fn validate_row(row: &IdentifierRow, policy: LengthPolicy) -> ValidationRow {
    match row.kind.trim().to_ascii_lowercase().as_str() {
        "iban" => ValidationRow::from(&validate_iban_with(&row.value, true, policy)),
        "bban" => {
            let country = row
                .country
                .as_deref()
                .map(|code| code.trim().to_uppercase())
                .unwrap_or_default();
            ValidationRow::from(&validate_bban(&row.value, &country, true))
        }
        "pan" => ValidationRow::from(&validate_pan(&row.value)),
        _ => ValidationRow::unsupported(&row.kind, &row.value),
    }
}
