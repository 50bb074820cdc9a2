use crate::error::ValidationError;

/// Post-normalization alphabet for letters; `A` encodes to 10, `Z` to 35.
const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Two-digit code for an upper-case letter: position in the alphabet plus 10.
pub fn letter_code(ch: char) -> Option<u32> {
    ALPHABET
        .iter()
        .position(|letter| char::from(*letter) == ch)
        .map(|idx| idx as u32 + 10)
}

/// Re-encodes `[A-Z0-9]` input as a pure digit string.
///
/// Digits pass through, letters become their two-digit [`letter_code`].
/// Anything else fails with the character's position in `input`.
pub fn encode_alphanumeric(input: &str) -> Result<String, ValidationError> {
    let mut out = String::with_capacity(input.len() * 2);
    for (position, ch) in input.chars().enumerate() {
        if ch.is_ascii_digit() {
            out.push(ch);
        } else if let Some(code) = letter_code(ch) {
            out.push_str(&code.to_string());
        } else {
            return Err(ValidationError::MalformedCharacter {
                character: ch,
                position,
            });
        }
    }
    Ok(out)
}

/// Remainder of the base-10 number `digits` divided by 97.
///
/// Folds a running remainder so input length is unbounded. Returns `None`
/// if a non-digit is present.
pub fn mod97_remainder(digits: &str) -> Option<u32> {
    let mut remainder: u32 = 0;
    for ch in digits.chars() {
        let d = ch.to_digit(10)?;
        remainder = (remainder * 10 + d) % 97;
    }
    Some(remainder)
}

/// True iff `digits mod 97 == 1`. Callers pass digits only; anything else is
/// reported as a failed check rather than a panic.
pub fn mod97_check(digits: &str) -> bool {
    mod97_remainder(digits) == Some(1)
}

/// Luhn (mod 10) check over a digit string.
pub fn luhn_check(digits: &str) -> Result<bool, ValidationError> {
    let sum = luhn_sum(digits, false)?;
    Ok(sum % 10 == 0)
}

/// Digit that, appended to `payload`, makes the whole string pass
/// [`luhn_check`].
pub fn luhn_check_digit(payload: &str) -> Result<u8, ValidationError> {
    // The rightmost payload digit sits second-from-right once the check
    // digit is appended, so doubling starts immediately.
    let sum = luhn_sum(payload, true)?;
    Ok(((10 - sum % 10) % 10) as u8)
}

fn luhn_sum(digits: &str, double_first: bool) -> Result<u32, ValidationError> {
    let chars: Vec<char> = digits.chars().collect();
    let mut sum = 0u32;
    let mut double = double_first;
    for (position, ch) in chars.iter().enumerate().rev() {
        let mut d = ch
            .to_digit(10)
            .ok_or(ValidationError::MalformedCharacter {
                character: *ch,
                position,
            })?;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    Ok(sum)
}

/// ISO 13616 check digits for `country` and `bban`, zero padded.
pub fn iban_check_digits(country: &str, bban: &str) -> Result<String, ValidationError> {
    if country.len() != 2 {
        return Err(ValidationError::CountryUnknown {
            country: country.to_string(),
        });
    }
    let combined = format!("{}{}00", bban, country);
    let encoded = encode_alphanumeric(&combined)?;
    let remainder = mod97_remainder(&encoded).unwrap_or(0);
    Ok(format!("{:02}", 98 - remainder))
}
