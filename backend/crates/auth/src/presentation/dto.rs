//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so that absent fields map to a 400
//! `MissingField` instead of a deserialization rejection.

use serde::{Deserialize, Serialize};

// ============================================================================
// OTP Request
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpResponse {
    pub success: bool,
    pub message: String,
    /// Canonical phone
    pub phone: String,
    /// Only in test mode or after a delivery failure with fallback enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_otp: Option<String>,
}

// ============================================================================
// OTP Verify
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub is_new_user: bool,
    pub message: String,
}

// ============================================================================
// Session Status
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub account_id: Option<String>,
    pub expires_at_ms: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_otp_omitted_when_absent() {
        let response = RequestOtpResponse {
            success: true,
            message: "Verification code sent".into(),
            phone: "+391234567890".into(),
            debug_otp: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("debugOtp").is_none());
        assert_eq!(json["phone"], "+391234567890");
    }

    #[test]
    fn test_verify_response_camel_case() {
        let response = VerifyOtpResponse {
            success: true,
            is_new_user: true,
            message: "Signed in".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isNewUser"], true);
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let req: VerifyOtpRequest = serde_json::from_str(r#"{"phone":"+391234567890"}"#).unwrap();
        assert!(req.otp.is_none());
    }
}
