//! WhatsApp Cloud API Notifier
//!
//! Sends text messages through the Graph API:
//! `POST {api_base}/{phone_number_id}/messages` with a Bearer token.
//! Message copy is Italian, matching the product audience.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::domain::notifier::{Notifier, NotifierError};
use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};

/// Graph API base including version
pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v18.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub access_token: String,
    pub phone_number_id: String,
    pub api_base: String,
}

impl WhatsAppConfig {
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.phone_number_id
        )
    }
}

/// Notifier backed by WhatsApp. Without credentials every send fails with
/// [`NotifierError::NotConfigured`], which callers treat like any other
/// delivery failure.
#[derive(Debug, Clone)]
pub struct WhatsAppNotifier {
    client: Client,
    config: Option<WhatsAppConfig>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

impl WhatsAppNotifier {
    /// Fails only when the HTTP client cannot be built (TLS backend init)
    pub fn new(config: Option<WhatsAppConfig>) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifierError::Transport(format!("client build failed: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn send_text(&self, phone: &Phone, body: &str) -> Result<(), NotifierError> {
        let config = self.config.as_ref().ok_or(NotifierError::NotConfigured)?;

        let message = TextMessage {
            messaging_product: "whatsapp",
            to: phone.digits(),
            kind: "text",
            text: TextBody { body },
        };

        let response = self
            .client
            .post(config.messages_url())
            .bearer_auth(&config.access_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(phone = %phone.masked(), "WhatsApp message accepted");
        Ok(())
    }
}

impl Notifier for WhatsAppNotifier {
    async fn send_code(&self, phone: &Phone, code: &OtpCode) -> Result<(), NotifierError> {
        self.send_text(phone, &otp_message(code)).await
    }

    async fn send_welcome(&self, phone: &Phone) -> Result<(), NotifierError> {
        self.send_text(phone, &welcome_message()).await
    }
}

pub fn otp_message(code: &OtpCode) -> String {
    format!(
        "🔐 *disciplinaFit*\n\nIl tuo codice di verifica è: *{}*\n\nValido per 5 minuti.\n\nNon condividere questo codice con nessuno.",
        code.as_str()
    )
}

pub fn welcome_message() -> String {
    "🎉 *Benvenuto in disciplinaFit!*\n\nSei pronto a prenderti cura di te, con disciplina?\n\nInizia subito la tua prima challenge!"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let config = WhatsAppConfig::new("token", "12345");
        assert_eq!(
            config.messages_url(),
            "https://graph.facebook.com/v18.0/12345/messages"
        );
    }

    #[test]
    fn test_payload_shape() {
        let message = TextMessage {
            messaging_product: "whatsapp",
            to: "391234567890",
            kind: "text",
            text: TextBody { body: "ciao" },
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["to"], "391234567890");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "ciao");
    }

    #[test]
    fn test_otp_message_contains_code() {
        let code = OtpCode::from_db("482913".to_string());
        let message = otp_message(&code);
        assert!(message.contains("*482913*"));
        assert!(message.contains("5 minuti"));
    }

    #[test]
    fn test_new_keeps_credentials() {
        let notifier = WhatsAppNotifier::new(Some(WhatsAppConfig::new("token", "12345"))).unwrap();
        assert!(notifier.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_fails_without_network() {
        let notifier = WhatsAppNotifier::new(None).unwrap();
        let phone = Phone::from_db("+391234567890".to_string());
        let result = notifier.send_welcome(&phone).await;
        assert!(matches!(result, Err(NotifierError::NotConfigured)));
    }
}
