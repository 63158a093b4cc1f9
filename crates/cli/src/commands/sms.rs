//! SMS command handler.

use clap::Args;
use sanchar_core::{config::AppConfig, AppResult};
use sanchar_sms::create_sink;
use std::process::ExitCode;

/// Send a text message
#[derive(Args, Debug)]
pub struct SmsCommand {
    /// Destination phone number
    pub phone: String,

    /// Message body
    pub message: String,

    /// Sink (twilio, log)
    #[arg(long, default_value = "twilio")]
    pub sink: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SmsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing sms command");

        let sink = create_sink(&self.sink, &config.sms)?;
        let receipt = sink.send(&self.phone, &self.message).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        } else {
            println!("SMS sent ({})", receipt.status);
        }

        Ok(ExitCode::SUCCESS)
    }
}
