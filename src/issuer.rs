use once_cell::sync::Lazy;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Luhn,
    None,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Luhn => "luhn",
            Algorithm::None => "none",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One IIN range: PANs of `min_length..=max_length` digits whose first
/// `prefix_digits` digits fall in `prefix_low..=prefix_high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerRange {
    pub prefix_low: u32,
    pub prefix_high: u32,
    pub prefix_digits: usize,
    pub issuer_name: &'static str,
    pub min_length: usize,
    pub max_length: usize,
    pub algorithm: Algorithm,
}

impl IssuerRange {
    fn span(&self) -> u32 {
        self.prefix_high - self.prefix_low
    }

    /// The numeric prefix this range would claim from `digits`, if it does.
    pub fn matching_prefix(&self, digits: &str, total_length: usize) -> Option<u32> {
        if total_length < self.min_length || total_length > self.max_length {
            return None;
        }
        let prefix = digits.get(..self.prefix_digits)?;
        if !prefix.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        let value: u32 = prefix.parse().ok()?;
        if (self.prefix_low..=self.prefix_high).contains(&value) {
            Some(value)
        } else {
            None
        }
    }
}

const fn range(
    prefix_low: u32,
    prefix_high: u32,
    prefix_digits: usize,
    issuer_name: &'static str,
    min_length: usize,
    max_length: usize,
    algorithm: Algorithm,
) -> IssuerRange {
    IssuerRange {
        prefix_low,
        prefix_high,
        prefix_digits,
        issuer_name,
        min_length,
        max_length,
        algorithm,
    }
}

use Algorithm::{Luhn, None as NoCheck};

pub const ISSUER_RANGES: &[IssuerRange] = &[
    range(1, 1, 1, "UATP", 15, 15, Luhn),
    range(4, 4, 1, "Visa", 16, 16, Luhn),
    range(34, 34, 2, "American Express", 15, 15, Luhn),
    range(37, 37, 2, "American Express", 15, 15, Luhn),
    range(31, 31, 2, "China T-Union", 19, 19, Luhn),
    range(62, 62, 2, "China UnionPay", 16, 19, Luhn),
    range(81, 81, 2, "China UnionPay", 16, 19, Luhn),
    range(36, 36, 2, "Diners Club International", 14, 19, Luhn),
    range(38, 39, 2, "Diners Club International", 16, 19, Luhn),
    range(60, 60, 2, "RuPay", 16, 16, Luhn),
    range(50, 50, 2, "Maestro", 12, 19, Luhn),
    range(56, 69, 2, "Maestro", 12, 19, Luhn),
    range(51, 55, 2, "Mastercard", 16, 16, Luhn),
    range(64, 64, 2, "Discover Card", 16, 19, Luhn),
    range(65, 65, 2, "Discover Card", 16, 19, Luhn),
    range(636, 636, 3, "Interpayment", 16, 19, Luhn),
    range(300, 305, 3, "Diners Club International", 16, 19, Luhn),
    range(637, 639, 3, "InstaPayment", 16, 16, Luhn),
    range(5610, 5610, 4, "Bankcard", 16, 16, Luhn),
    range(2014, 2014, 4, "Diners Club enRoute", 15, 15, NoCheck),
    range(2149, 2149, 4, "Diners Club enRoute", 15, 15, NoCheck),
    range(3095, 3095, 4, "Diners Club International", 16, 19, Luhn),
    range(6011, 6011, 4, "Discover Card", 16, 19, Luhn),
    range(6521, 6522, 4, "RuPay", 16, 16, Luhn),
    range(3528, 3589, 4, "JCB", 16, 19, Luhn),
    range(6304, 6304, 4, "Laser", 16, 19, Luhn),
    range(6706, 6706, 4, "Laser", 16, 19, Luhn),
    range(6771, 6771, 4, "Laser", 16, 19, Luhn),
    range(6709, 6709, 4, "Laser", 16, 19, Luhn),
    range(6759, 6759, 4, "Maestro UK", 12, 19, Luhn),
    range(5019, 5019, 4, "Dankort", 16, 16, Luhn),
    range(4571, 4571, 4, "Dankort", 16, 16, Luhn),
    range(2200, 2204, 4, "MIR", 16, 16, Luhn),
    range(2221, 2720, 4, "Mastercard", 16, 16, Luhn),
    range(6334, 6334, 4, "Solo", 16, 16, Luhn),
    range(6334, 6334, 4, "Solo", 18, 19, Luhn),
    range(6767, 6767, 4, "Solo", 16, 16, Luhn),
    range(6767, 6767, 4, "Solo", 18, 19, Luhn),
    range(4903, 4903, 4, "Switch", 16, 16, Luhn),
    range(4903, 4903, 4, "Switch", 18, 19, Luhn),
    range(4905, 4905, 4, "Switch", 16, 16, Luhn),
    range(4905, 4905, 4, "Switch", 18, 19, Luhn),
    range(4911, 4911, 4, "Switch", 16, 16, Luhn),
    range(4911, 4911, 4, "Switch", 18, 19, Luhn),
    range(4936, 4936, 4, "Switch", 16, 16, Luhn),
    range(4936, 4936, 4, "Switch", 18, 19, Luhn),
    range(6333, 6333, 4, "Switch", 16, 16, Luhn),
    range(6333, 6333, 4, "Switch", 18, 19, Luhn),
    range(6759, 6759, 4, "Switch", 16, 16, Luhn),
    range(6759, 6759, 4, "Switch", 18, 19, Luhn),
    range(560221, 560225, 6, "Bankard", 16, 16, Luhn),
    range(622126, 622925, 6, "Discover Card", 16, 19, Luhn),
    range(624000, 626999, 6, "Discover Card", 16, 19, Luhn),
    range(628200, 628899, 6, "Discover Card", 16, 19, Luhn),
    range(676770, 676770, 6, "Maestro UK", 12, 19, Luhn),
    range(676774, 676774, 6, "Maestro UK", 12, 19, Luhn),
    range(564182, 564182, 6, "Switch", 16, 16, Luhn),
    range(564182, 564182, 6, "Switch", 18, 19, Luhn),
    range(633110, 633110, 6, "Switch", 16, 16, Luhn),
    range(633110, 633110, 6, "Switch", 18, 19, Luhn),
    range(979200, 979289, 6, "Troy", 16, 16, Luhn),
    range(506099, 506198, 6, "Verve", 16, 16, Luhn),
    range(506099, 506198, 6, "Verve", 19, 19, Luhn),
    range(650002, 650027, 6, "Verve", 16, 16, Luhn),
    range(650002, 650027, 6, "Verve", 19, 19, Luhn),
    range(357111, 357111, 6, "LankaPay", 16, 16, Luhn),
    range(6054740, 6054744, 7, "NPS Pridnestrovie", 16, 16, Luhn),
];

/// Ranges in evaluation order: longest prefix first, then the narrowest
/// numeric span, then table order. Sorting is stable, so the order is the
/// same on every run.
static ORDERED: Lazy<Vec<&'static IssuerRange>> = Lazy::new(|| {
    let mut ordered: Vec<&'static IssuerRange> = ISSUER_RANGES.iter().collect();
    ordered.sort_by(|a, b| {
        b.prefix_digits
            .cmp(&a.prefix_digits)
            .then_with(|| a.span().cmp(&b.span()))
    });
    log::trace!("built issuer range registry ({} ranges)", ordered.len());
    ordered
});

/// Ranges in the order [`lookup`] evaluates them.
pub fn ordered_ranges() -> &'static [&'static IssuerRange] {
    ORDERED.as_slice()
}

/// Most specific range matching `digits`, with the numeric IIN it claimed.
pub fn lookup(digits: &str, total_length: usize) -> Option<(&'static IssuerRange, u32)> {
    ORDERED.iter().find_map(|range| {
        range
            .matching_prefix(digits, total_length)
            .map(|iin| (*range, iin))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_well_formed() {
        for range in ISSUER_RANGES {
            assert!(range.prefix_low <= range.prefix_high, "{:?}", range);
            assert!(range.min_length <= range.max_length, "{:?}", range);
            assert_eq!(
                range.prefix_high.to_string().len(),
                range.prefix_digits,
                "{:?}",
                range
            );
        }
    }

    #[test]
    fn evaluation_order_is_longest_prefix_first() {
        let widths: Vec<usize> = ordered_ranges().iter().map(|r| r.prefix_digits).collect();
        let mut sorted = widths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(widths, sorted);
    }

    #[test]
    fn mastercard_two_digit_prefix() {
        let (range, iin) = lookup("5460976249685093", 16).expect("match");
        assert_eq!(range.issuer_name, "Mastercard");
        assert_eq!(iin, 54);
    }

    #[test]
    fn longer_prefix_beats_broader_range() {
        let (range, iin) = lookup("6011000990139424", 16).expect("match");
        assert_eq!(range.issuer_name, "Discover Card");
        assert_eq!(iin, 6011);

        let (range, iin) = lookup("4571000000000000", 16).expect("match");
        assert_eq!(range.issuer_name, "Dankort");
        assert_eq!(iin, 4571);
    }

    #[test]
    fn narrower_range_wins_among_equal_widths() {
        // 65 sits inside Maestro's 56-69 as well as Discover's 65-65.
        let (range, _) = lookup("6500000000000000", 16).expect("match");
        assert_eq!(range.issuer_name, "Discover Card");

        // Maestro still applies where no narrower range claims the prefix.
        let (range, iin) = lookup("5800000000000", 13).expect("match");
        assert_eq!(range.issuer_name, "Maestro");
        assert_eq!(iin, 58);
    }

    #[test]
    fn length_selects_between_duplicate_prefixes() {
        let (range, _) = lookup("6334000000000000", 16).expect("match");
        assert_eq!((range.min_length, range.max_length), (16, 16));
        let (range, _) = lookup("633400000000000000", 18).expect("match");
        assert_eq!((range.min_length, range.max_length), (18, 19));
        // No Solo range takes 17 digits, so the broader Maestro range applies.
        let (range, iin) = lookup("63340000000000000", 17).expect("match");
        assert_eq!(range.issuer_name, "Maestro");
        assert_eq!(iin, 63);
    }

    #[test]
    fn no_match_for_unknown_prefix_or_length() {
        assert!(lookup("9000000000000000", 16).is_none());
        assert!(lookup("4111111111111", 13).is_none());
        assert!(lookup("", 0).is_none());
    }
}
