//! Ask command handler.
//!
//! Runs the answer pipeline for one question and optionally sends the
//! answer by SMS.

use super::{build_pipeline, open_repository};
use clap::Args;
use sanchar_core::{config::AppConfig, AppResult};
use sanchar_schemes::AnswerOutcome;
use sanchar_sms::{create_sink, DeliverySink};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Answer a question about welfare schemes
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question, in any language
    pub question: String,

    /// Also send the answer to this phone number
    #[arg(long, value_name = "PHONE")]
    pub sms: Option<String>,

    /// SMS sink used with --sms (twilio, log)
    #[arg(long, default_value = "twilio")]
    pub sink: String,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let repository = Arc::new(open_repository(config)?);
        if repository.count()? == 0 {
            tracing::warn!("Scheme store is empty. Run 'sanchar seed' to load the sample schemes");
        }

        let pipeline = build_pipeline(config, repository)?;

        let outcome = match self.timeout_secs {
            Some(secs) => {
                pipeline
                    .answer_within(&self.question, Duration::from_secs(secs))
                    .await
            }
            None => pipeline.answer(&self.question).await,
        };

        if let Some(detail) = outcome.detail() {
            tracing::error!(kind = ?outcome.kind(), "Answer failed: {}", detail);
        }

        let sink = match &self.sms {
            Some(_) if outcome.is_success() => self.open_sink(config),
            _ => None,
        };
        let delivery = self.sms.as_deref().zip(sink.as_deref());

        report(&outcome, self.json, delivery, &mut std::io::stdout()).await
    }

    fn open_sink(&self, config: &AppConfig) -> Option<Arc<dyn DeliverySink>> {
        match create_sink(&self.sink, &config.sms) {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::warn!("SMS not sent: {}", e);
                None
            }
        }
    }
}

/// Print the outcome and, for a successful answer, send it through
/// `delivery`. Delivery failures are logged only; the exit code follows
/// the outcome alone.
pub(crate) async fn report(
    outcome: &AnswerOutcome,
    json: bool,
    delivery: Option<(&str, &dyn DeliverySink)>,
    out: &mut impl Write,
) -> AppResult<ExitCode> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?;
    } else {
        writeln!(out, "{}", outcome.user_text())?;
    }

    if let (Some((phone, sink)), AnswerOutcome::Success { text }) = (delivery, outcome) {
        match sink.send(phone, text).await {
            Ok(receipt) => tracing::info!(
                sink = %receipt.sink,
                status = %receipt.status,
                "SMS sent to {}",
                receipt.destination
            ),
            Err(e) => tracing::warn!(sink = sink.name(), "Failed to send SMS: {}", e),
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
