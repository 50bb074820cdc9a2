//! Validation and decomposition of IBANs, BBANs and payment card numbers.
//!
//! Reference tables (country formats, issuer ranges) are compiled in and
//! built once on first use; every validation call is a pure function of its
//! input and safe to run from many threads.

pub mod batch;
pub mod bban;
pub mod checksum;
pub mod country;
pub mod error;
pub mod generator;
pub mod iban;
pub mod issuer;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pan;

pub use bban::{guess_bban_country, validate_bban, BbanRecord};
pub use checksum::{iban_check_digits, luhn_check, luhn_check_digit, mod97_check};
pub use error::ValidationError;
pub use iban::{
    guess_iban_country, validate_iban, validate_iban_with, IbanParts, IbanRecord, LengthPolicy,
};
pub use issuer::Algorithm;
pub use normalize::normalize;
pub use pan::{validate_pan, IssuerMatch, PanRecord};
