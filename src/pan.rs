use crate::checksum::luhn_check;
use crate::error::{too_short, ValidationError};
use crate::issuer::{self, Algorithm};
use crate::normalize::{mask_middle, normalize};

pub const MIN_PAN_INPUT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerMatch {
    pub issuer_name: &'static str,
    pub iin: u32,
    pub algorithm: Algorithm,
}

/// Outcome of one PAN validation. `issuer` is kept when the checksum fails
/// so callers can still report which network the number claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanRecord {
    pub raw: String,
    pub normalized: String,
    pub issuer: Option<IssuerMatch>,
    pub error: Option<ValidationError>,
}

impl PanRecord {
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

pub fn validate_pan(raw: &str) -> PanRecord {
    let normalized = normalize(raw);
    let mut record = PanRecord {
        raw: raw.to_string(),
        normalized,
        issuer: None,
        error: None,
    };
    if let Err(err) = check_pan(&mut record) {
        log::debug!("PAN {} rejected: {}", mask_pan(&record.normalized), err.kind());
        record.error = Some(err);
    }
    record
}

/// Six-digit IIN and last four digits; everything between is starred.
fn mask_pan(value: &str) -> String {
    mask_middle(value, 6, 4)
}

fn check_pan(record: &mut PanRecord) -> Result<(), ValidationError> {
    let clean = record.normalized.clone();
    let length = clean.chars().count();
    if let Some(err) = too_short(length, MIN_PAN_INPUT) {
        return Err(err);
    }
    if let Some((position, character)) = clean
        .chars()
        .enumerate()
        .find(|(_, ch)| !ch.is_ascii_digit())
    {
        return Err(ValidationError::MalformedCharacter {
            character,
            position,
        });
    }

    let (range, iin) = issuer::lookup(&clean, length).ok_or(ValidationError::NoIssuerMatch)?;
    record.issuer = Some(IssuerMatch {
        issuer_name: range.issuer_name,
        iin,
        algorithm: range.algorithm,
    });

    if range.algorithm == Algorithm::Luhn && !luhn_check(&clean)? {
        return Err(ValidationError::ChecksumMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_mastercard() {
        let record = validate_pan("5460976249685093");
        assert!(record.is_valid());
        assert_eq!(record.normalized, "5460976249685093");
        let issuer = record.issuer.expect("issuer");
        assert_eq!(issuer.issuer_name, "Mastercard");
        assert_eq!(issuer.iin, 54);
        assert_eq!(issuer.algorithm, Algorithm::Luhn);
    }

    #[test]
    fn separators_are_stripped() {
        let record = validate_pan("5460.9762.4968.5093");
        assert!(record.is_valid());
        assert_eq!(record.normalized, "5460976249685093");
    }

    #[test]
    fn checksum_failure_keeps_issuer() {
        let record = validate_pan("5574351064815128");
        assert_eq!(record.error, Some(ValidationError::ChecksumMismatch));
        assert_eq!(record.issuer.map(|i| i.issuer_name), Some("Mastercard"));
    }

    #[test]
    fn short_input() {
        let record = validate_pan("4111 111");
        assert_eq!(
            record.error,
            Some(ValidationError::InputTooShort {
                length: 7,
                minimum: 8
            })
        );
    }

    #[test]
    fn letters_are_malformed() {
        let record = validate_pan("5460 9762 4968 509A");
        assert_eq!(
            record.error,
            Some(ValidationError::MalformedCharacter {
                character: 'A',
                position: 15
            })
        );
        assert!(record.issuer.is_none());
    }

    #[test]
    fn unknown_prefix() {
        let record = validate_pan("9999999999999995");
        assert_eq!(record.error, Some(ValidationError::NoIssuerMatch));
    }

    #[test]
    fn enroute_skips_checksum() {
        // Fails Luhn, but enRoute ranges carry no check digit.
        let record = validate_pan("201400000000001");
        assert!(record.is_valid());
        let issuer = record.issuer.unwrap();
        assert_eq!(issuer.issuer_name, "Diners Club enRoute");
        assert_eq!(issuer.algorithm, Algorithm::None);
        assert_eq!(issuer.iin, 2014);
    }

    #[test]
    fn visa_test_number() {
        let record = validate_pan("4111-1111-1111-1111");
        assert!(record.is_valid());
        assert_eq!(record.issuer.unwrap().issuer_name, "Visa");
    }

    #[test]
    fn masked_pan_keeps_iin_and_last_four() {
        assert_eq!(mask_pan("5574351064815128"), "557435******5128");
        assert_eq!(mask_pan("4111111"), "*******");
    }
}
