use crate::country;
use crate::error::{too_short, ValidationError};
use crate::normalize::{mask_middle, normalize_if};
use std::collections::BTreeSet;

const MIN_BBAN_INPUT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BbanRecord {
    pub raw: String,
    pub normalized: String,
    pub country_code: String,
    pub error: Option<ValidationError>,
}

impl BbanRecord {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Self, ValidationError> {
        match self.error.clone() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Checks a domestic account number against `country`'s BBAN pattern.
/// National check digits inside the BBAN are not verified.
pub fn validate_bban(raw: &str, country_code: &str, cleanup: bool) -> BbanRecord {
    let normalized = normalize_if(raw, cleanup);
    let error = check_bban(&normalized, country_code).err();
    if let Some(err) = &error {
        log::debug!(
            "BBAN {} for {} rejected: {}",
            mask_middle(&normalized, 0, 4),
            country_code,
            err.kind()
        );
    }
    BbanRecord {
        raw: raw.to_string(),
        normalized,
        country_code: country_code.to_string(),
        error,
    }
}

fn check_bban(clean: &str, country_code: &str) -> Result<(), ValidationError> {
    let length = clean.chars().count();
    if let Some(err) = too_short(length, MIN_BBAN_INPUT) {
        return Err(err);
    }
    let format = country::lookup(country_code).ok_or_else(|| ValidationError::CountryUnknown {
        country: country_code.to_string(),
    })?;

    let expected = format.bban.len();
    if length != expected {
        return Err(ValidationError::LengthMismatch {
            country: format.country_code.to_string(),
            expected,
            actual: length,
        });
    }
    match format.bban.first_mismatch(clean) {
        Some((position, character)) => Err(ValidationError::MalformedCharacter {
            character,
            position,
        }),
        None => Ok(()),
    }
}

/// Countries whose BBAN pattern fits `raw`.
pub fn guess_bban_country(raw: &str, cleanup: bool) -> BTreeSet<&'static str> {
    let clean = normalize_if(raw, cleanup);
    if clean.chars().count() < MIN_BBAN_INPUT {
        return BTreeSet::new();
    }
    country::guess_countries(&clean)
}
