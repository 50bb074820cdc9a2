use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Character class of one BBAN slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `n`: digits 0-9
    Digit,
    /// `a`: upper-case letters A-Z
    Alpha,
    /// `c`: upper-case letters or digits
    Alnum,
}

impl CharClass {
    pub fn accepts(self, ch: char) -> bool {
        match self {
            CharClass::Digit => ch.is_ascii_digit(),
            CharClass::Alpha => ch.is_ascii_uppercase(),
            CharClass::Alnum => ch.is_ascii_digit() || ch.is_ascii_uppercase(),
        }
    }

    fn code(self) -> char {
        match self {
            CharClass::Digit => 'n',
            CharClass::Alpha => 'a',
            CharClass::Alnum => 'c',
        }
    }
}

/// A run of `len` characters of the same class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub class: CharClass,
    pub len: usize,
}

const fn n(len: usize) -> Segment {
    Segment {
        class: CharClass::Digit,
        len,
    }
}

const fn a(len: usize) -> Segment {
    Segment {
        class: CharClass::Alpha,
        len,
    }
}

const fn c(len: usize) -> Segment {
    Segment {
        class: CharClass::Alnum,
        len,
    }
}

/// Fixed-width BBAN shape, e.g. `4a14n` for GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbanPattern(pub &'static [Segment]);

impl BbanPattern {
    pub fn len(&self) -> usize {
        self.0.iter().map(|segment| segment.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class expected at each position, left to right.
    pub fn classes(&self) -> impl Iterator<Item = CharClass> + '_ {
        self.0
            .iter()
            .flat_map(|segment| std::iter::repeat(segment.class).take(segment.len))
    }

    /// First position (and the character there) that does not fit its slot.
    /// Length is not checked here.
    pub fn first_mismatch(&self, bban: &str) -> Option<(usize, char)> {
        bban.chars()
            .zip(self.classes())
            .enumerate()
            .find(|(_, (ch, class))| !class.accepts(*ch))
            .map(|(idx, (ch, _))| (idx, ch))
    }

    pub fn matches(&self, bban: &str) -> bool {
        bban.chars().count() == self.len() && self.first_mismatch(bban).is_none()
    }
}

impl fmt::Display for BbanPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.0 {
            write!(f, "{}{}", segment.len, segment.class.code())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryFormat {
    pub country_code: &'static str,
    /// Full IBAN length: country code, two check digits and the BBAN.
    pub total_length: usize,
    pub bban: BbanPattern,
}

const fn entry(
    country_code: &'static str,
    total_length: usize,
    bban: &'static [Segment],
) -> CountryFormat {
    CountryFormat {
        country_code,
        total_length,
        bban: BbanPattern(bban),
    }
}

pub const COUNTRY_FORMATS: &[CountryFormat] = &[
    entry("AD", 24, &[n(8), c(12)]),
    entry("AE", 23, &[n(19)]),
    entry("AL", 28, &[n(8), c(16)]),
    entry("AT", 20, &[n(16)]),
    entry("AZ", 28, &[a(4), c(20)]),
    entry("BA", 20, &[n(16)]),
    entry("BE", 16, &[n(12)]),
    entry("BG", 22, &[a(4), n(6), c(8)]),
    entry("BH", 22, &[a(4), c(14)]),
    entry("BR", 29, &[n(23), a(1), c(1)]),
    entry("BY", 28, &[c(4), n(4), c(16)]),
    entry("CH", 21, &[n(5), c(12)]),
    entry("CR", 22, &[n(18)]),
    entry("CY", 28, &[n(8), c(16)]),
    entry("CZ", 24, &[n(20)]),
    entry("DE", 22, &[n(18)]),
    entry("DK", 18, &[n(14)]),
    entry("DO", 28, &[c(4), n(20)]),
    entry("EE", 20, &[n(16)]),
    entry("EG", 29, &[n(25)]),
    entry("ES", 24, &[n(20)]),
    entry("FI", 18, &[n(14)]),
    entry("FO", 18, &[n(14)]),
    entry("FR", 27, &[n(10), c(11), n(2)]),
    entry("GB", 22, &[a(4), n(14)]),
    entry("GE", 22, &[a(2), n(16)]),
    entry("GI", 23, &[a(4), c(15)]),
    entry("GL", 18, &[n(14)]),
    entry("GR", 27, &[n(7), c(16)]),
    entry("GT", 28, &[c(24)]),
    entry("HR", 21, &[n(17)]),
    entry("HU", 28, &[n(24)]),
    entry("IE", 22, &[a(4), n(14)]),
    entry("IL", 23, &[n(19)]),
    entry("IQ", 23, &[a(4), n(15)]),
    entry("IS", 26, &[n(22)]),
    entry("IT", 27, &[a(1), n(10), c(12)]),
    entry("JO", 30, &[a(4), n(4), c(18)]),
    entry("KW", 30, &[a(4), c(22)]),
    entry("KZ", 20, &[n(3), c(13)]),
    entry("LB", 28, &[n(4), c(20)]),
    entry("LC", 32, &[a(4), c(24)]),
    entry("LI", 21, &[n(5), c(12)]),
    entry("LT", 20, &[n(16)]),
    entry("LU", 20, &[n(3), c(13)]),
    entry("LV", 21, &[a(4), c(13)]),
    entry("MC", 27, &[n(10), c(11), n(2)]),
    entry("MD", 24, &[c(20)]),
    entry("ME", 22, &[n(18)]),
    entry("MK", 19, &[n(3), c(10), n(2)]),
    entry("MR", 27, &[n(23)]),
    entry("MT", 31, &[a(4), n(5), c(18)]),
    entry("MU", 30, &[a(4), n(19), a(3)]),
    entry("NL", 18, &[a(4), n(10)]),
    entry("NO", 15, &[n(11)]),
    entry("PK", 24, &[a(4), c(16)]),
    entry("PL", 28, &[n(24)]),
    entry("PS", 29, &[a(4), c(21)]),
    entry("PT", 25, &[n(21)]),
    entry("QA", 29, &[a(4), c(21)]),
    entry("RO", 24, &[a(4), c(16)]),
    entry("RS", 22, &[n(18)]),
    entry("SA", 24, &[n(2), c(18)]),
    entry("SC", 31, &[a(4), n(20), a(3)]),
    entry("SE", 24, &[n(20)]),
    entry("SI", 19, &[n(15)]),
    entry("SK", 24, &[n(20)]),
    entry("SM", 27, &[a(1), n(10), c(12)]),
    entry("TL", 23, &[n(19)]),
    entry("TN", 24, &[n(20)]),
    entry("TR", 26, &[n(5), c(17)]),
    entry("UA", 29, &[n(6), c(19)]),
    entry("VG", 24, &[a(4), n(16)]),
    entry("XK", 20, &[n(16)]),
];

static REGISTRY: Lazy<HashMap<&'static str, &'static CountryFormat>> = Lazy::new(|| {
    log::trace!("building country format registry ({} entries)", COUNTRY_FORMATS.len());
    COUNTRY_FORMATS
        .iter()
        .map(|format| (format.country_code, format))
        .collect()
});

pub fn lookup(country_code: &str) -> Option<&'static CountryFormat> {
    REGISTRY.get(country_code).copied()
}

/// Every registered country whose BBAN pattern matches `body` exactly.
///
/// `body` may also carry its own country code and check digits
/// (`AT61...`). That country is included when the rest fits its pattern.
/// Distinct countries share BBAN shapes, so the full set is returned and the
/// caller decides; an empty set means no country fits.
pub fn guess_countries(body: &str) -> BTreeSet<&'static str> {
    let mut countries: BTreeSet<&'static str> = COUNTRY_FORMATS
        .iter()
        .filter(|format| format.bban.matches(body))
        .map(|format| format.country_code)
        .collect();
    if let Some(format) = prefixed_format(body) {
        countries.insert(format.country_code);
    }
    countries
}

/// The registered country `body` names in its first two characters, if the
/// next two are digits and the remainder fits that country's BBAN pattern.
pub fn prefixed_format(body: &str) -> Option<&'static CountryFormat> {
    let format = lookup(body.get(..2)?)?;
    let check_digits = body.get(2..4)?;
    if !check_digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let bban = body.get(4..)?;
    format.bban.matches(bban).then_some(format)
}
