//! Phone Value Object
//!
//! The canonical phone number is the identity key of an account.
//!
//! ## Processing order
//! 1. [`normalize`]: strip formatting, rewrite `00` to `+`, prepend the
//!    default country code when no `+` is present. Total, never fails.
//! 2. [`is_valid`]: `+` followed by 10 to 15 ASCII digits.
//!
//! Validation always runs on the normalized form.

use serde::Serialize;
use std::fmt;

/// Country code used when the input carries no international prefix
pub const DEFAULT_COUNTRY_CODE: &str = "+39";

/// Minimum digit count after `+`
pub const PHONE_MIN_DIGITS: usize = 10;

/// Maximum digit count after `+`
pub const PHONE_MAX_DIGITS: usize = 15;

/// Error returned when the normalized input is not a phone number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid phone number")]
pub struct InvalidPhone;

/// Convert arbitrary user input into canonical international form.
///
/// Whitespace, hyphens and parentheses are removed. A leading `00`
/// becomes `+`. Input without a leading `+` gets `default_country_code`
/// prepended.
pub fn normalize(input: &str, default_country_code: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();

    if let Some(rest) = stripped.strip_prefix("00") {
        return format!("+{}", rest);
    }
    if stripped.starts_with('+') {
        return stripped;
    }
    format!("{}{}", default_country_code, stripped)
}

/// `+` followed by 10 to 15 ASCII digits
pub fn is_valid(canonical: &str) -> bool {
    match canonical.strip_prefix('+') {
        Some(digits) => {
            (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len())
                && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Validated canonical phone number
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Normalize then validate
    pub fn parse(input: &str, default_country_code: &str) -> Result<Self, InvalidPhone> {
        let canonical = normalize(input, default_country_code);
        if is_valid(&canonical) {
            Ok(Self(canonical))
        } else {
            Err(InvalidPhone)
        }
    }

    /// Restore from database (already canonical)
    pub fn from_db(canonical: String) -> Self {
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits without the leading `+` (messaging API recipient format)
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }

    /// Log-safe form: country prefix and last 3 digits only
    pub fn masked(&self) -> String {
        let len = self.0.len();
        if len <= 6 {
            return "*".repeat(len);
        }
        format!("{}{}{}", &self.0[..3], "*".repeat(len - 6), &self.0[len - 3..])
    }
}

impl fmt::Debug for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Phone").field(&self.masked()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_formatting() {
        assert_eq!(
            normalize("+39 (123) 456-7890", DEFAULT_COUNTRY_CODE),
            "+391234567890"
        );
        assert_eq!(normalize(" +39\t123 456 7890 ", "+39"), "+391234567890");
    }

    #[test]
    fn test_normalize_international_prefix() {
        assert_eq!(normalize("0039 123 456 7890", "+39"), "+391234567890");
        assert_eq!(normalize("0044 20 7946 0958", "+39"), "+442079460958");
    }

    #[test]
    fn test_normalize_prepends_default_country_code() {
        assert_eq!(normalize("333 123 4567", "+39"), "+393331234567");
        assert_eq!(normalize("3331234567", "+1"), "+13331234567");
    }

    #[test]
    fn test_normalize_is_total() {
        // Garbage in, canonical-looking garbage out; validation rejects it.
        assert_eq!(normalize("", "+39"), "+39");
        assert_eq!(normalize("abc", "+39"), "+39abc");
        assert!(!is_valid(&normalize("abc", "+39")));
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "+39 (123) 456-7890",
            "0039 123 456 7890",
            "333-123-4567",
            "  +44 20 7946 0958",
            "00",
            "",
            "(0) 12",
            "++39",
        ];
        for input in inputs {
            let once = normalize(input, DEFAULT_COUNTRY_CODE);
            let twice = normalize(&once, DEFAULT_COUNTRY_CODE);
            assert_eq!(once, twice, "normalize not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_is_valid_bounds() {
        assert!(is_valid("+1234567890")); // 10 digits
        assert!(is_valid("+123456789012345")); // 15 digits
        assert!(!is_valid("+123456789")); // 9 digits
        assert!(!is_valid("+1234567890123456")); // 16 digits
        assert!(!is_valid("1234567890"));
        assert!(!is_valid("+12345678a0"));
        assert!(!is_valid("+"));
    }

    #[test]
    fn test_parse() {
        let phone = Phone::parse("333 123 4567", "+39").unwrap();
        assert_eq!(phone.as_str(), "+393331234567");
        assert_eq!(phone.digits(), "393331234567");
        assert_eq!(Phone::parse("12", "+39"), Err(InvalidPhone));
    }

    #[test]
    fn test_masked_hides_middle_digits() {
        let phone = Phone::from_db("+391234567890".to_string());
        assert_eq!(phone.masked(), "+39*******890");
        assert!(!format!("{:?}", phone).contains("1234567"));
    }
}
