use crate::checksum::{encode_alphanumeric, mod97_check};
use crate::country::{self, CountryFormat, COUNTRY_FORMATS};
use crate::error::{too_short, ValidationError};
use crate::normalize::{mask_middle, normalize_if};
use std::collections::BTreeMap;

pub const MIN_IBAN_INPUT: usize = 2;

/// How strictly the cleaned length is held against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Only reject IBANs shorter than the registered length.
    Minimum,
    /// Length must equal the registered length.
    #[default]
    Exact,
    /// Exact length and every BBAN character in its pattern's class.
    Structural,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbanParts {
    pub country_code: String,
    pub check_digits: String,
    pub bban: String,
}

/// Outcome of one IBAN validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbanRecord {
    pub raw: String,
    /// Cleaned, not rearranged.
    pub normalized: String,
    /// Only set for a valid IBAN.
    pub parts: Option<IbanParts>,
    pub error: Option<ValidationError>,
}

impl IbanRecord {
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

/// Validates an IBAN under [`LengthPolicy::Exact`].
pub fn validate_iban(raw: &str, cleanup: bool) -> IbanRecord {
    validate_iban_with(raw, cleanup, LengthPolicy::default())
}

pub fn validate_iban_with(raw: &str, cleanup: bool, policy: LengthPolicy) -> IbanRecord {
    let normalized = normalize_if(raw, cleanup);
    let outcome = check_iban(&normalized, policy);
    if let Err(err) = &outcome {
        log::debug!("IBAN {} rejected: {}", mask_iban(&normalized), err.kind());
    }
    IbanRecord {
        raw: raw.to_string(),
        parts: outcome.as_ref().ok().cloned(),
        error: outcome.err(),
        normalized,
    }
}

/// Country code, check digits and the last four characters stay readable.
fn mask_iban(value: &str) -> String {
    mask_middle(value, 4, 4)
}

fn check_iban(clean: &str, policy: LengthPolicy) -> Result<IbanParts, ValidationError> {
    let length = clean.chars().count();
    if let Some(err) = too_short(length, MIN_IBAN_INPUT) {
        return Err(err);
    }

    let country_code: String = clean.chars().take(2).collect();
    let format = country::lookup(&country_code).ok_or_else(|| ValidationError::CountryUnknown {
        country: country_code.clone(),
    })?;

    check_length(format, clean, length, policy)?;

    let header: String = clean.chars().take(4).collect();
    let body: String = clean.chars().skip(4).collect();

    let rearranged = format!("{}{}", body, header);
    let encoded = encode_alphanumeric(&rearranged).map_err(|err| match err {
        ValidationError::MalformedCharacter {
            character,
            position,
        } => ValidationError::MalformedCharacter {
            character,
            position: (position + 4) % length,
        },
        other => other,
    })?;

    if !mod97_check(&encoded) {
        return Err(ValidationError::ChecksumMismatch);
    }

    Ok(IbanParts {
        country_code,
        check_digits: header.chars().skip(2).collect(),
        bban: body,
    })
}

fn check_length(
    format: &CountryFormat,
    clean: &str,
    length: usize,
    policy: LengthPolicy,
) -> Result<(), ValidationError> {
    let mismatch = match policy {
        LengthPolicy::Minimum => length < format.total_length,
        LengthPolicy::Exact | LengthPolicy::Structural => length != format.total_length,
    };
    if mismatch {
        return Err(ValidationError::LengthMismatch {
            country: format.country_code.to_string(),
            expected: format.total_length,
            actual: length,
        });
    }

    if policy == LengthPolicy::Structural {
        let bban: String = clean.chars().skip(4).collect();
        if let Some((position, character)) = format.bban.first_mismatch(&bban) {
            return Err(ValidationError::MalformedCharacter {
                character,
                position: position + 4,
            });
        }
    }
    Ok(())
}

/// Countries whose IBAN could carry `raw` as its body.
///
/// The body is read as a bare BBAN, as check digits followed by a BBAN, or
/// as a complete IBAN with its own country code. A bare BBAN fitting a
/// country's pattern is a candidate; the other two forms must also pass
/// mod-97 with that country. Each candidate maps to the IBAN it implies. An
/// empty map means nothing fits.
pub fn guess_iban_country(raw: &str, cleanup: bool) -> BTreeMap<String, String> {
    let body = normalize_if(raw, cleanup);
    let mut candidates = BTreeMap::new();
    if body.chars().count() < MIN_IBAN_INPUT {
        return candidates;
    }

    for country in COUNTRY_FORMATS
        .iter()
        .filter(|format| format.bban.matches(&body))
        .map(|format| format.country_code)
    {
        candidates.insert(country.to_string(), format!("{}{}", country, body));
    }

    if let Some(format) = country::prefixed_format(&body) {
        if validate_iban(&body, false).is_valid() {
            candidates.insert(format.country_code.to_string(), body.clone());
        }
    }

    let check_digits = body.get(..2).filter(|cd| cd.chars().all(|ch| ch.is_ascii_digit()));
    if let (Some(_), Some(bban)) = (check_digits, body.get(2..)) {
        for country in country::guess_countries(bban) {
            let candidate = format!("{}{}", country, body);
            if validate_iban(&candidate, false).is_valid() {
                candidates.insert(country.to_string(), candidate);
            }
        }
    }

    log::debug!(
        "IBAN body {} fits {} country(ies)",
        mask_iban(&body),
        candidates.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_gb_iban_with_cleanup() {
        let record = validate_iban("GB82 WEST 1234 5698 7654 32", true);
        assert!(record.is_valid());
        assert_eq!(record.normalized, "GB82WEST12345698765432");
        let parts = record.parts.expect("parts");
        assert_eq!(parts.country_code, "GB");
        assert_eq!(parts.check_digits, "82");
        assert_eq!(parts.bban, "WEST12345698765432");
    }

    #[test]
    fn altered_digit_fails_checksum() {
        let record = validate_iban("GB82 WEST 1234 6698 7654 32", true);
        assert_eq!(record.normalized, "GB82WEST12346698765432");
        assert_eq!(record.error, Some(ValidationError::ChecksumMismatch));
        assert!(record.parts.is_none());
    }

    #[test]
    fn unknown_country() {
        let record = validate_iban("ZZ123", false);
        assert_eq!(
            record.error,
            Some(ValidationError::CountryUnknown {
                country: "ZZ".to_string()
            })
        );
        assert_eq!(record.normalized, "ZZ123");
    }

    #[test]
    fn too_short_input() {
        let record = validate_iban(" - ", true);
        assert_eq!(
            record.error,
            Some(ValidationError::InputTooShort {
                length: 0,
                minimum: 2
            })
        );
    }

    #[test]
    fn without_cleanup_lowercase_is_unknown_country() {
        let record = validate_iban("gb82west12345698765432", false);
        assert!(matches!(
            record.error,
            Some(ValidationError::CountryUnknown { .. })
        ));
    }

    #[test]
    fn short_iban_is_length_mismatch_under_every_policy() {
        for policy in [
            LengthPolicy::Minimum,
            LengthPolicy::Exact,
            LengthPolicy::Structural,
        ] {
            let record = validate_iban_with("GB82WEST1234569876543", false, policy);
            assert_eq!(
                record.error,
                Some(ValidationError::LengthMismatch {
                    country: "GB".to_string(),
                    expected: 22,
                    actual: 21
                })
            );
        }
    }

    #[test]
    fn over_long_iban_depends_on_policy() {
        // GB + correct check digits for an over-long BBAN.
        let bban = "WEST123456987654320";
        let check = crate::checksum::iban_check_digits("GB", bban).unwrap();
        let iban = format!("GB{}{}", check, bban);

        let minimum = validate_iban_with(&iban, false, LengthPolicy::Minimum);
        assert!(minimum.is_valid());

        let exact = validate_iban_with(&iban, false, LengthPolicy::Exact);
        assert!(matches!(
            exact.error,
            Some(ValidationError::LengthMismatch {
                expected: 22,
                actual: 23,
                ..
            })
        ));
    }

    #[test]
    fn structural_policy_checks_bban_classes() {
        // Valid checksum but a digit where GB expects a letter.
        let bban = "W3ST12345698765432";
        let check = crate::checksum::iban_check_digits("GB", bban).unwrap();
        let iban = format!("GB{}{}", check, bban);

        assert!(validate_iban_with(&iban, false, LengthPolicy::Exact).is_valid());
        assert_eq!(
            validate_iban_with(&iban, false, LengthPolicy::Structural).error,
            Some(ValidationError::MalformedCharacter {
                character: '3',
                position: 5
            })
        );
    }

    #[test]
    fn malformed_character_position_is_in_normalized_iban() {
        let record = validate_iban("GB82WEST1234569876543/", false);
        assert_eq!(
            record.error,
            Some(ValidationError::MalformedCharacter {
                character: '/',
                position: 21
            })
        );
    }

    #[test]
    fn accepts_austrian_iban_with_separators() {
        let record = validate_iban("AT61 1904 3002 3457 3201", true);
        assert!(record.is_valid());
        assert_eq!(record.parts.unwrap().bban, "1904300234573201");
    }

    #[test]
    fn guess_from_bare_bban() {
        let guesses = guess_iban_country("3-456.789-0123.45678", true);
        assert_eq!(guesses.get("AT").map(String::as_str), Some("AT3456789012345678"));
        assert!(guesses.contains_key("LT"));
    }

    #[test]
    fn guess_from_check_digits_and_bban() {
        let guesses = guess_iban_country("82WEST12345698765432", false);
        assert_eq!(
            guesses.get("GB").map(String::as_str),
            Some("GB82WEST12345698765432")
        );
        // IE shares the shape, but the check digits only hold for GB.
        assert!(!guesses.contains_key("IE"));
    }

    #[test]
    fn guess_from_full_iban() {
        let guesses = guess_iban_country("GB82 WEST 1234 5698 7654 32", true);
        assert_eq!(
            guesses.get("GB").map(String::as_str),
            Some("GB82WEST12345698765432")
        );

        let guesses = guess_iban_country("AT611904300234573201", false);
        assert_eq!(
            guesses.get("AT").map(String::as_str),
            Some("AT611904300234573201")
        );
    }

    #[test]
    fn guess_skips_prefixed_body_with_bad_check_digits() {
        // Right shape for AT, wrong check digits.
        let guesses = guess_iban_country("AT621904300234573201", false);
        assert!(!guesses.contains_key("AT"));
    }

    #[test]
    fn masked_iban_keeps_header_and_tail() {
        assert_eq!(mask_iban("GB82WEST12345698765432"), "GB82**************5432");
    }

    #[test]
    fn guess_nothing_fits() {
        assert!(guess_iban_country("12", false).is_empty());
        assert!(guess_iban_country("X", false).is_empty());
    }

    #[test]
    fn into_result_matches_error() {
        assert!(validate_iban("GB82WEST12345698765432", false)
            .into_result()
            .is_ok());
        assert_eq!(
            validate_iban("ZZ", false).into_result().unwrap_err().kind(),
            "country_unknown"
        );
    }
}
