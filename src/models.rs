use crate::bban::BbanRecord;
use crate::iban::IbanRecord;
use crate::pan::PanRecord;
use serde::{Deserialize, Serialize};

/// One identifier to check, as read from (or written to) a batch CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRow {
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// One line of batch output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRow {
    pub kind: String,
    pub raw: String,
    pub normalized: String,
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub check_digits: Option<String>,
    #[serde(default)]
    pub bban: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub iin: Option<u32>,
    #[serde(default)]
    pub algorithm: Option<String>,
}

impl ValidationRow {
    fn blank(kind: &str, raw: &str, normalized: &str) -> Self {
        Self {
            kind: kind.to_string(),
            raw: raw.to_string(),
            normalized: normalized.to_string(),
            valid: false,
            error: None,
            country: None,
            check_digits: None,
            bban: None,
            issuer: None,
            iin: None,
            algorithm: None,
        }
    }

    pub fn unsupported(kind: &str, raw: &str) -> Self {
        let mut row = Self::blank(kind, raw, "");
        row.error = Some("unsupported_kind".to_string());
        row
    }
}

impl From<&IbanRecord> for ValidationRow {
    fn from(record: &IbanRecord) -> Self {
        let mut row = Self::blank("iban", &record.raw, &record.normalized);
        row.valid = record.is_valid();
        row.error = record.error.as_ref().map(|err| err.kind().to_string());
        if let Some(parts) = &record.parts {
            row.country = Some(parts.country_code.clone());
            row.check_digits = Some(parts.check_digits.clone());
            row.bban = Some(parts.bban.clone());
        }
        row
    }
}

impl From<&BbanRecord> for ValidationRow {
    fn from(record: &BbanRecord) -> Self {
        let mut row = Self::blank("bban", &record.raw, &record.normalized);
        row.valid = record.is_valid();
        row.error = record.error.as_ref().map(|err| err.kind().to_string());
        row.country = Some(record.country_code.clone());
        if record.is_valid() {
            row.bban = Some(record.normalized.clone());
        }
        row
    }
}

impl From<&PanRecord> for ValidationRow {
    fn from(record: &PanRecord) -> Self {
        let mut row = Self::blank("pan", &record.raw, &record.normalized);
        row.valid = record.is_valid();
        row.error = record.error.as_ref().map(|err| err.kind().to_string());
        if let Some(issuer) = &record.issuer {
            row.issuer = Some(issuer.issuer_name.to_string());
            row.iin = Some(issuer.iin);
            row.algorithm = Some(issuer.algorithm.to_string());
        }
        row
    }
}
