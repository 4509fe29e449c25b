//! Session Token
//!
//! Cookie value format: `<session_uuid>.<base64url(HMAC-SHA256(secret, session_uuid))>`.
//! The signature lets forged cookies be rejected without a database lookup.

use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Sign a session id
pub fn create_session_token(secret: &[u8; 32], session_id: Uuid) -> String {
    let id = session_id.to_string();
    let signature = hmac_sha256(secret, id.as_bytes());
    format!("{}.{}", id, to_base64_url(&signature))
}

/// Verify the signature and return the session id
pub fn parse_session_token(secret: &[u8; 32], token: &str) -> AuthResult<Uuid> {
    let (id, signature_b64) = token.split_once('.').ok_or(AuthError::SessionInvalid)?;

    let signature = from_base64_url(signature_b64).map_err(|_| AuthError::SessionInvalid)?;
    if !verify_hmac_sha256(secret, id.as_bytes(), &signature) {
        return Err(AuthError::SessionInvalid);
    }

    id.parse().map_err(|_| AuthError::SessionInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let secret = [9u8; 32];
        let id = Uuid::new_v4();
        let token = create_session_token(&secret, id);
        assert_eq!(parse_session_token(&secret, &token).unwrap(), id);
    }

    #[test]
    fn test_rejects_forged_tokens() {
        let secret = [9u8; 32];
        let id = Uuid::new_v4();
        let token = create_session_token(&secret, id);

        // wrong key
        assert!(parse_session_token(&[8u8; 32], &token).is_err());
        // swapped id
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::new_v4(), sig);
        assert!(parse_session_token(&secret, &forged).is_err());
        // malformed
        assert!(parse_session_token(&secret, "no-dot").is_err());
        assert!(parse_session_token(&secret, "a.%%%").is_err());
    }
}
