//! Delivery sink abstraction.

use crate::sinks::{LogSink, TwilioCredentials, TwilioSink};
use sanchar_core::config::SmsConfig;
use sanchar_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;

/// Acknowledgement returned by a sink after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// Sink that accepted the message
    pub sink: String,

    /// Gateway message id, when the gateway assigns one
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Gateway status such as "queued"
    pub status: String,

    pub destination: String,
}

/// Sends a text message to a phone number.
#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    /// Sink name used in logs and receipts.
    fn name(&self) -> &str;

    /// Deliver `body` to `destination`.
    async fn send(&self, destination: &str, body: &str) -> AppResult<DeliveryReceipt>;
}

/// Reject an empty destination or body before any I/O.
pub(crate) fn validate_message(destination: &str, body: &str) -> AppResult<()> {
    if destination.trim().is_empty() || body.trim().is_empty() {
        return Err(AppError::Validation(
            "Phone and message are required".to_string(),
        ));
    }
    Ok(())
}

/// Create a sink by name.
///
/// `"twilio"` reads credentials from the environment variables named in
/// `config`; `"log"` never leaves the process.
pub fn create_sink(name: &str, config: &SmsConfig) -> AppResult<Arc<dyn DeliverySink>> {
    match name.to_lowercase().as_str() {
        "twilio" => {
            let credentials = TwilioCredentials::from_env(config)?;
            let sink = match config.endpoint.as_deref() {
                Some(endpoint) => TwilioSink::with_base_url(credentials, endpoint),
                None => TwilioSink::new(credentials),
            };
            Ok(Arc::new(sink))
        }
        "log" => Ok(Arc::new(LogSink)),
        other => Err(AppError::Config(format!(
            "Unknown SMS sink: {}. Supported: twilio, log",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_message() {
        assert!(validate_message("+919800000000", "नमस्ते").is_ok());
        assert!(validate_message("", "नमस्ते").is_err());
        assert!(validate_message("+919800000000", "  ").is_err());
    }

    #[test]
    fn test_create_log_sink() {
        let sink = create_sink("LOG", &SmsConfig::default()).unwrap();
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn test_create_unknown_sink_fails() {
        let err = create_sink("pigeon", &SmsConfig::default()).err().unwrap();
        assert!(err.to_string().contains("pigeon"));
    }

    #[test]
    fn test_create_twilio_without_credentials_fails() {
        let config = SmsConfig {
            account_sid_env: "SANCHAR_TEST_MISSING_SID".to_string(),
            auth_token_env: "SANCHAR_TEST_MISSING_TOKEN".to_string(),
            from_number_env: "SANCHAR_TEST_MISSING_FROM".to_string(),
            endpoint: None,
        };
        let err = create_sink("twilio", &config).err().unwrap();
        assert!(err.to_string().contains("SANCHAR_TEST_MISSING_SID"));
    }
}
