//! OTP Code Value Object
//!
//! Six-digit numeric code drawn uniformly from `[100000, 999999]`.
//! Codes are never zero-padded, so the first digit is never `0`.

use rand::Rng;
use std::fmt;

/// Smallest code that can be issued
pub const OTP_CODE_MIN: u32 = 100_000;

/// Largest code that can be issued
pub const OTP_CODE_MAX: u32 = 999_999;

#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a fresh code from the thread-local CSPRNG
    pub fn generate() -> Self {
        let value = rand::rng().random_range(OTP_CODE_MIN..=OTP_CODE_MAX);
        Self(value.to_string())
    }

    /// Restore from database
    pub fn from_db(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact match, compared in constant time
    pub fn matches(&self, candidate: &str) -> bool {
        platform::crypto::constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_range() {
        for _ in 0..1000 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(!code.as_str().starts_with('0'));
            let value: u32 = code.as_str().parse().unwrap();
            assert!((OTP_CODE_MIN..=OTP_CODE_MAX).contains(&value));
        }
    }

    #[test]
    fn test_matches_exactly() {
        let code = OtpCode::from_db("123456".to_string());
        assert!(code.matches("123456"));
        assert!(!code.matches("123457"));
        assert!(!code.matches(" 123456"));
        assert!(!code.matches(""));
    }

    #[test]
    fn test_debug_redaction() {
        let code = OtpCode::from_db("654321".to_string());
        assert!(!format!("{:?}", code).contains("654321"));
    }
}
