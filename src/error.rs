use thiserror::Error;

/// Why an identifier was rejected.
///
/// Every variant is an expected outcome for malformed input and is returned
/// to the caller as part of the validation record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("input too short: {length} characters, at least {minimum} required")]
    InputTooShort { length: usize, minimum: usize },

    #[error("unknown country code {country:?}")]
    CountryUnknown { country: String },

    #[error("invalid length for {country}: expected {expected}, got {actual}")]
    LengthMismatch {
        country: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed character {character:?} at position {position}")]
    MalformedCharacter { character: char, position: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("no issuer matches the card number prefix and length")]
    NoIssuerMatch,
}

impl ValidationError {
    /// Stable machine-readable name, used in CSV output and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InputTooShort { .. } => "input_too_short",
            ValidationError::CountryUnknown { .. } => "country_unknown",
            ValidationError::LengthMismatch { .. } => "length_mismatch",
            ValidationError::MalformedCharacter { .. } => "malformed_character",
            ValidationError::ChecksumMismatch => "checksum_mismatch",
            ValidationError::NoIssuerMatch => "no_issuer_match",
        }
    }
}

pub(crate) fn too_short(length: usize, minimum: usize) -> Option<ValidationError> {
    if length < minimum {
        Some(ValidationError::InputTooShort { length, minimum })
    } else {
        None
    }
}
