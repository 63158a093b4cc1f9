//! Twilio Programmable Messaging sink.
//!
//! `POST {base}/2010-04-01/Accounts/{sid}/Messages.json`, form encoded,
//! authenticated with the account SID and auth token.

use crate::sink::{validate_message, DeliveryReceipt, DeliverySink};
use sanchar_core::config::SmsConfig;
use sanchar_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Account credentials and sender number.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .finish()
    }
}

impl TwilioCredentials {
    /// Read credentials from the environment variables named in `config`.
    pub fn from_env(config: &SmsConfig) -> AppResult<Self> {
        Ok(Self {
            account_sid: read_env(&config.account_sid_env)?,
            auth_token: read_env(&config.auth_token_env)?,
            from_number: read_env(&config.from_number_env)?,
        })
    }
}

fn read_env(name: &str) -> AppResult<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "SMS gateway credential not set. Export {}",
                name
            ))
        })
}

#[derive(Debug, Serialize)]
struct MessageForm<'a> {
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio sink.
pub struct TwilioSink {
    base_url: String,
    credentials: TwilioCredentials,
    client: reqwest::Client,
}

impl TwilioSink {
    pub fn new(credentials: TwilioCredentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a sink with a custom base URL.
    pub fn with_base_url(credentials: TwilioCredentials, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    fn receipt(&self, response: MessageResponse, destination: &str) -> DeliveryReceipt {
        DeliveryReceipt {
            sink: self.name().to_string(),
            message_id: response.sid,
            status: response.status.unwrap_or_else(|| "accepted".to_string()),
            destination: destination.to_string(),
        }
    }
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            code: Some(code),
            message: Some(message),
        }) => format!("{} (code {})", message, code),
        Ok(ErrorResponse {
            message: Some(message),
            ..
        }) => message,
        _ => body.chars().take(200).collect(),
    }
}

#[async_trait::async_trait]
impl DeliverySink for TwilioSink {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, destination: &str, body: &str) -> AppResult<DeliveryReceipt> {
        validate_message(destination, body)?;

        tracing::info!(to = %destination, "Sending SMS via Twilio");

        let form = MessageForm {
            to: destination,
            from: &self.credentials.from_number,
            body,
        };

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Failed to send request to Twilio: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Delivery(format!("Failed to read Twilio response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Delivery(format!(
                "Twilio API error ({}): {}",
                status,
                describe_error(&text)
            )));
        }

        let message: MessageResponse = serde_json::from_str(&text)
            .map_err(|e| AppError::Delivery(format!("Failed to parse Twilio response: {}", e)))?;

        tracing::debug!("Twilio accepted message {:?}", message.sid);

        Ok(self.receipt(message, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> TwilioCredentials {
        TwilioCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15005550006".to_string(),
        }
    }

    #[test]
    fn test_endpoint_format() {
        let sink = TwilioSink::with_base_url(credentials(), "http://localhost:4010/");
        assert_eq!(
            sink.endpoint(),
            "http://localhost:4010/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("AC123"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_receipt_from_response() {
        let sink = TwilioSink::new(credentials());
        let response: MessageResponse =
            serde_json::from_str(r#"{"sid": "SM42", "status": "queued", "to": "+919800000000"}"#)
                .unwrap();

        let receipt = sink.receipt(response, "+919800000000");
        assert_eq!(receipt.message_id.as_deref(), Some("SM42"));
        assert_eq!(receipt.status, "queued");
        assert_eq!(receipt.sink, "twilio");
    }

    #[test]
    fn test_describe_error() {
        assert_eq!(
            describe_error(r#"{"code": 21211, "message": "Invalid 'To' Phone Number"}"#),
            "Invalid 'To' Phone Number (code 21211)"
        );
        assert_eq!(describe_error("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_form_field_names() {
        let form = MessageForm {
            to: "+919800000000",
            from: "+15005550006",
            body: "नमस्ते",
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["To"], "+919800000000");
        assert_eq!(value["Body"], "नमस्ते");
    }

    #[tokio::test]
    async fn test_blank_destination_rejected_before_io() {
        // Unroutable base URL: a request would fail with a Delivery error
        let sink = TwilioSink::with_base_url(credentials(), "http://127.0.0.1:9");
        let err = sink.send(" ", "नमस्ते").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
