//! Derived Credentials
//!
//! Accounts never have a user-chosen password. Instead, each account's
//! credential is derived from its canonical phone number with a server-held
//! key: `hex(HMAC-SHA256(secret, phone))`. The same phone always yields the
//! same credential, so nothing has to be stored to re-derive it.
//!
//! The credential is stored at rest only as an Argon2id hash (PHC string),
//! optionally peppered. Session establishment re-derives the credential and
//! verifies it against the stored hash.
//!
//! ## Security
//! - Compromise of the derivation secret is equivalent to compromise of
//!   every account credential. Treat it as a root secret.
//! - [`DerivedCredential`] zeroizes on drop and redacts its Debug output.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{hmac_sha256, to_hex};

/// Credential hashing errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Hashing operation failed
    #[error("Credential hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid credential hash format")]
    InvalidHashFormat,

    /// Derivation secret is empty
    #[error("Credential secret is not configured")]
    MissingSecret,
}

// ============================================================================
// Derived Credential (Zeroized on drop)
// ============================================================================

/// Server-side credential derived from a canonical phone number.
///
/// Does not implement `Clone`. Never serialize or log it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedCredential(String);

impl DerivedCredential {
    /// Derive the credential for `phone` with `secret`.
    pub fn derive(secret: &[u8], phone: &str) -> Result<Self, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::MissingSecret);
        }
        Ok(Self(to_hex(&hmac_sha256(secret, phone.as_bytes()))))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Vec<u8> {
        let mut bytes = self.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Hash the credential using Argon2id
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<CredentialHash, CredentialError> {
        let mut bytes = self.peppered(pepper);
        let salt = SaltString::generate(&mut OsRng);

        // OWASP defaults: m=19456 (19 MiB), t=2, p=1
        let result = Argon2::default()
            .hash_password(&bytes, &salt)
            .map(|h| CredentialHash {
                hash: h.to_string(),
            })
            .map_err(|e| CredentialError::HashingFailed(e.to_string()));

        bytes.zeroize();
        result
    }
}

impl fmt::Debug for DerivedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivedCredential")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Credential Hash (Safe to store)
// ============================================================================

/// Argon2id hash of a [`DerivedCredential`] in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash {
    hash: String,
}

impl CredentialHash {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, CredentialError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| CredentialError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a credential against this hash (constant-time inside argon2)
    pub fn verify(&self, credential: &DerivedCredential, pepper: Option<&[u8]>) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        let mut bytes = credential.peppered(pepper);
        let ok = Argon2::default()
            .verify_password(&bytes, &parsed_hash)
            .is_ok();
        bytes.zeroize();
        ok
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHash")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-derivation-secret";

    #[test]
    fn test_derivation_is_deterministic() {
        let a = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        let b = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        // hex of a 32-byte MAC
        assert_eq!(a.as_bytes().len(), 64);
    }

    #[test]
    fn test_derivation_depends_on_phone_and_secret() {
        let a = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        let b = DerivedCredential::derive(SECRET, "+391234567891").unwrap();
        let c = DerivedCredential::derive(b"other-secret", "+391234567890").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            DerivedCredential::derive(b"", "+391234567890"),
            Err(CredentialError::MissingSecret)
        ));
    }

    #[test]
    fn test_hash_and_verify_with_pepper() {
        let credential = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        let pepper = b"pepper";
        let hashed = credential.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&credential, Some(pepper)));
        assert!(!hashed.verify(&credential, None));

        let other = DerivedCredential::derive(SECRET, "+391234567891").unwrap();
        assert!(!hashed.verify(&other, Some(pepper)));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let credential = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        let hashed = credential.hash(None).unwrap();
        let restored = CredentialHash::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&credential, None));
        assert!(CredentialHash::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let credential = DerivedCredential::derive(SECRET, "+391234567890").unwrap();
        let debug_output = format!("{:?}", credential);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains(&String::from_utf8_lossy(credential.as_bytes()).to_string()));
    }
}
