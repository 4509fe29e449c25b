//! Replace Confirmation Token
//!
//! Issued with an `ActiveDisciplineExists` conflict and required to confirm
//! the replacement. It binds the account, the target discipline and the
//! exact set of active enrollments the user was shown, so a replay after
//! that set changed (or for another discipline) is rejected.
//!
//! Format: `<base64url(payload)>.<base64url(HMAC-SHA256(secret, payload))>`
//! with `payload = account|discipline|expires_at_ms|id,id,...`.

use kernel::id::{AccountId, DisciplineId, EnrollmentId};
use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};

/// State a token is bound to
#[derive(Debug, Clone, Copy)]
pub struct ReplaceBinding<'a> {
    pub account_id: AccountId,
    pub discipline_id: DisciplineId,
    /// Sorted ids of the active enrollments to be replaced
    pub active: &'a [EnrollmentId],
}

impl ReplaceBinding<'_> {
    fn payload(&self, expires_at_ms: i64) -> String {
        let ids = self
            .active
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}|{}|{}|{}",
            self.account_id, self.discipline_id, expires_at_ms, ids
        )
    }
}

pub fn issue_replace_token(secret: &[u8; 32], binding: ReplaceBinding<'_>, expires_at_ms: i64) -> String {
    let payload = binding.payload(expires_at_ms);
    let signature = hmac_sha256(secret, payload.as_bytes());
    format!("{}.{}", to_base64_url(payload.as_bytes()), to_base64_url(&signature))
}

/// True iff the signature is valid, the token has not expired at `now_ms`
/// and it was issued for exactly `binding`.
pub fn verify_replace_token(
    secret: &[u8; 32],
    token: &str,
    binding: ReplaceBinding<'_>,
    now_ms: i64,
) -> bool {
    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return false;
    };
    let (Ok(payload), Ok(signature)) = (from_base64_url(payload_b64), from_base64_url(signature_b64))
    else {
        return false;
    };
    if !verify_hmac_sha256(secret, &payload, &signature) {
        return false;
    }

    let Ok(payload) = String::from_utf8(payload) else {
        return false;
    };
    let Some(expires_at_ms) = payload
        .split('|')
        .nth(2)
        .and_then(|v| v.parse::<i64>().ok())
    else {
        return false;
    };

    expires_at_ms > now_ms && payload == binding.payload(expires_at_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    fn ids(n: usize) -> Vec<EnrollmentId> {
        let mut ids: Vec<_> = (0..n).map(|_| EnrollmentId::new()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_valid_token_accepted() {
        let active = ids(1);
        let binding = ReplaceBinding {
            account_id: AccountId::new(),
            discipline_id: DisciplineId::new(),
            active: &active,
        };
        let token = issue_replace_token(&SECRET, binding, 10_000);
        assert!(verify_replace_token(&SECRET, &token, binding, 9_999));
    }

    #[test]
    fn test_expired_token_rejected() {
        let active = ids(1);
        let binding = ReplaceBinding {
            account_id: AccountId::new(),
            discipline_id: DisciplineId::new(),
            active: &active,
        };
        let token = issue_replace_token(&SECRET, binding, 10_000);
        assert!(!verify_replace_token(&SECRET, &token, binding, 10_000));
    }

    #[test]
    fn test_binding_mismatch_rejected() {
        let active = ids(1);
        let binding = ReplaceBinding {
            account_id: AccountId::new(),
            discipline_id: DisciplineId::new(),
            active: &active,
        };
        let token = issue_replace_token(&SECRET, binding, 10_000);

        let other_target = ReplaceBinding {
            discipline_id: DisciplineId::new(),
            ..binding
        };
        assert!(!verify_replace_token(&SECRET, &token, other_target, 0));

        let other_account = ReplaceBinding {
            account_id: AccountId::new(),
            ..binding
        };
        assert!(!verify_replace_token(&SECRET, &token, other_account, 0));

        let moved = ids(1);
        let moved_set = ReplaceBinding {
            active: &moved,
            ..binding
        };
        assert!(!verify_replace_token(&SECRET, &token, moved_set, 0));
    }

    #[test]
    fn test_forged_tokens_rejected() {
        let active = ids(2);
        let binding = ReplaceBinding {
            account_id: AccountId::new(),
            discipline_id: DisciplineId::new(),
            active: &active,
        };
        let token = issue_replace_token(&SECRET, binding, 10_000);

        assert!(!verify_replace_token(&[8u8; 32], &token, binding, 0));
        assert!(!verify_replace_token(&SECRET, "no-dot", binding, 0));
        assert!(!verify_replace_token(&SECRET, "%%%.%%%", binding, 0));

        // Extend expiry without re-signing
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = to_base64_url(binding.payload(i64::MAX).as_bytes());
        let forged = format!("{forged_payload}.{signature}");
        assert!(!verify_replace_token(&SECRET, &forged, binding, 0));
    }
}
