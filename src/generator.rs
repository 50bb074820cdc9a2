use crate::checksum::{iban_check_digits, luhn_check_digit};
use crate::country::{self, CharClass, CountryFormat, COUNTRY_FORMATS};
use crate::issuer::{self, Algorithm, IssuerRange, ISSUER_RANGES};
use crate::models::IdentifierRow;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MAX_PAN_ATTEMPTS: usize = 64;

pub struct GeneratorConfig {
    pub count: usize,
    /// Share of IBANs; the rest are PANs.
    pub iban_ratio: f64,
    /// Share of identifiers altered so their checksum fails.
    pub invalid_ratio: f64,
    /// Restrict IBANs to these countries; all registered countries if `None`.
    pub countries: Option<Vec<String>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 100,
            iban_ratio: 0.5,
            invalid_ratio: 0.0,
            countries: None,
        }
    }
}

pub fn generate_identifiers(
    config: &GeneratorConfig,
    seed: u64,
) -> Result<Vec<IdentifierRow>, String> {
    validate_config(config)?;
    let formats = resolve_formats(config.countries.as_deref())?;
    let luhn_ranges: Vec<&IssuerRange> = ISSUER_RANGES
        .iter()
        .filter(|range| range.algorithm == Algorithm::Luhn)
        .collect();
    let all_ranges: Vec<&IssuerRange> = ISSUER_RANGES.iter().collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let corrupt = rng.gen_bool(config.invalid_ratio);
        if rng.gen_bool(config.iban_ratio) {
            let format = formats
                .choose(&mut rng)
                .ok_or_else(|| "no countries to generate IBANs for".to_string())?;
            let mut iban = generate_iban(&mut rng, format)?;
            if corrupt {
                iban = corrupt_iban(&mut rng, &iban);
            }
            rows.push(IdentifierRow {
                kind: "iban".to_string(),
                value: iban,
                country: Some(format.country_code.to_string()),
            });
        } else {
            // Ranges without a check digit cannot be made to fail a checksum.
            let ranges = if corrupt { &luhn_ranges } else { &all_ranges };
            let mut pan = generate_pan(&mut rng, ranges)?;
            if corrupt {
                pan = corrupt_last_digit(&mut rng, &pan);
            }
            rows.push(IdentifierRow {
                kind: "pan".to_string(),
                value: pan,
                country: None,
            });
        }
    }
    Ok(rows)
}

fn validate_config(config: &GeneratorConfig) -> Result<(), String> {
    if !(0.0..=1.0).contains(&config.iban_ratio) {
        return Err("iban_ratio must be 0..1".to_string());
    }
    if !(0.0..=1.0).contains(&config.invalid_ratio) {
        return Err("invalid_ratio must be 0..1".to_string());
    }
    Ok(())
}

fn resolve_formats(countries: Option<&[String]>) -> Result<Vec<&'static CountryFormat>, String> {
    match countries {
        None => Ok(COUNTRY_FORMATS.iter().collect()),
        Some(codes) => codes
            .iter()
            .map(|code| {
                country::lookup(code).ok_or_else(|| format!("unknown country code: {}", code))
            })
            .collect(),
    }
}

pub fn generate_iban<R: Rng + ?Sized>(rng: &mut R, format: &CountryFormat) -> Result<String, String> {
    let mut bban = String::with_capacity(format.bban.len());
    for segment in format.bban.0 {
        let part = match segment.class {
            CharClass::Digit => random_digits(rng, segment.len),
            CharClass::Alpha => random_upper_letters(rng, segment.len),
            CharClass::Alnum => random_alphanum_upper(rng, segment.len),
        };
        bban.push_str(&part);
    }
    let check = iban_check_digits(format.country_code, &bban).map_err(|err| err.to_string())?;
    Ok(format!("{}{}{}", format.country_code, check, bban))
}

/// A PAN inside one of `ranges`, re-drawn until the registry resolves it
/// back to the range's own issuer.
pub fn generate_pan<R: Rng + ?Sized>(
    rng: &mut R,
    ranges: &[&IssuerRange],
) -> Result<String, String> {
    for _ in 0..MAX_PAN_ATTEMPTS {
        let range = ranges
            .choose(rng)
            .ok_or_else(|| "no issuer ranges to generate PANs for".to_string())?;
        let prefix = rng.gen_range(range.prefix_low..=range.prefix_high);
        let length = rng.gen_range(range.min_length..=range.max_length);

        let mut pan = format!("{:0width$}", prefix, width = range.prefix_digits);
        match range.algorithm {
            Algorithm::Luhn => {
                pan.push_str(&random_digits(rng, length - range.prefix_digits - 1));
                let check = luhn_check_digit(&pan).map_err(|err| err.to_string())?;
                pan.push(char::from(b'0' + check));
            }
            Algorithm::None => {
                pan.push_str(&random_digits(rng, length - range.prefix_digits));
            }
        }

        let resolved = issuer::lookup(&pan, length);
        if resolved.map(|(found, _)| found.issuer_name) == Some(range.issuer_name) {
            return Ok(pan);
        }
    }
    Err("could not draw a PAN that resolves to its own issuer".to_string())
}

/// Replaces one digit of the IBAN (check digits or BBAN) with a different
/// digit, which mod-97 always detects.
fn corrupt_iban<R: Rng + ?Sized>(rng: &mut R, iban: &str) -> String {
    let mut chars: Vec<char> = iban.chars().collect();
    let positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .skip(2)
        .filter(|(_, ch)| ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .collect();
    if let Some(&idx) = positions.choose(rng) {
        chars[idx] = different_digit(rng, chars[idx]);
    }
    chars.into_iter().collect()
}

fn corrupt_last_digit<R: Rng + ?Sized>(rng: &mut R, pan: &str) -> String {
    let mut chars: Vec<char> = pan.chars().collect();
    if let Some(last) = chars.last_mut() {
        *last = different_digit(rng, *last);
    }
    chars.into_iter().collect()
}

fn different_digit<R: Rng + ?Sized>(rng: &mut R, current: char) -> char {
    let digit = current.to_digit(10).unwrap_or(0);
    let shifted = (digit + rng.gen_range(1..10)) % 10;
    char::from(b'0' + shifted as u8)
}

pub fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let digit = rng.gen_range(0..10);
        out.push(char::from(b'0' + digit as u8));
    }
    out
}

pub fn random_alphanum_upper<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..CHARSET.len());
        out.push(char::from(CHARSET[idx]));
    }
    out
}

pub fn random_upper_letters<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..CHARSET.len());
        out.push(char::from(CHARSET[idx]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iban::{validate_iban_with, LengthPolicy};
    use crate::pan::validate_pan;

    #[test]
    fn same_seed_same_output() {
        let config = GeneratorConfig {
            count: 50,
            ..GeneratorConfig::default()
        };
        let first = generate_identifiers(&config, 7).unwrap();
        let second = generate_identifiers(&config, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn every_country_generates_structurally_valid_ibans() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for format in COUNTRY_FORMATS {
            let iban = generate_iban(&mut rng, format).unwrap();
            let record = validate_iban_with(&iban, false, LengthPolicy::Structural);
            assert!(record.is_valid(), "{} -> {:?}", iban, record.error);
        }
    }

    #[test]
    fn every_range_generates_valid_pans() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for range in ISSUER_RANGES {
            // A few narrow ranges are fully shadowed at some lengths; those
            // are allowed to fail the draw.
            if let Ok(pan) = generate_pan(&mut rng, &[range]) {
                let record = validate_pan(&pan);
                assert!(record.is_valid(), "{} -> {:?}", pan, record.error);
                assert_eq!(record.issuer.unwrap().issuer_name, range.issuer_name);
            }
        }
    }

    #[test]
    fn invalid_ratio_one_breaks_every_checksum() {
        let config = GeneratorConfig {
            count: 40,
            invalid_ratio: 1.0,
            ..GeneratorConfig::default()
        };
        for row in generate_identifiers(&config, 11).unwrap() {
            let error = match row.kind.as_str() {
                "iban" => validate_iban_with(&row.value, false, LengthPolicy::Structural).error,
                _ => validate_pan(&row.value).error,
            };
            assert_eq!(
                error,
                Some(crate::error::ValidationError::ChecksumMismatch),
                "{}",
                row.value
            );
        }
    }

    #[test]
    fn rejects_unknown_countries_and_bad_ratios() {
        let config = GeneratorConfig {
            countries: Some(vec!["ZZ".to_string()]),
            ..GeneratorConfig::default()
        };
        assert!(generate_identifiers(&config, 0).is_err());

        let config = GeneratorConfig {
            invalid_ratio: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(generate_identifiers(&config, 0).is_err());
    }

    #[test]
    fn restricted_countries() {
        let config = GeneratorConfig {
            count: 20,
            iban_ratio: 1.0,
            countries: Some(vec!["DE".to_string()]),
            ..GeneratorConfig::default()
        };
        for row in generate_identifiers(&config, 3).unwrap() {
            assert!(row.value.starts_with("DE"));
            assert_eq!(row.value.len(), 22);
        }
    }
}
