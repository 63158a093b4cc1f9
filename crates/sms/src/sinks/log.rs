use crate::sink::{validate_message, DeliveryReceipt, DeliverySink};
use sanchar_core::AppResult;

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait::async_trait]
impl DeliverySink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, destination: &str, body: &str) -> AppResult<DeliveryReceipt> {
        validate_message(destination, body)?;

        tracing::info!(to = %destination, chars = body.chars().count(), "SMS (not sent): {}", body);

        Ok(DeliveryReceipt {
            sink: self.name().to_string(),
            message_id: None,
            status: "logged".to_string(),
            destination: destination.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_accepts_message() {
        let receipt = LogSink
            .send("+919800000000", "जन धन योजना की जानकारी")
            .await
            .unwrap();

        assert_eq!(receipt.status, "logged");
        assert_eq!(receipt.destination, "+919800000000");
        assert!(receipt.message_id.is_none());
    }

    #[tokio::test]
    async fn test_log_sink_rejects_blank_body() {
        assert!(LogSink.send("+919800000000", "").await.is_err());
    }
}
