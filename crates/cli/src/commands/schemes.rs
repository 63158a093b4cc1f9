//! Schemes command handler.

use super::open_repository;
use clap::Args;
use sanchar_core::{config::AppConfig, AppResult};
use sanchar_schemes::SchemeRepository;
use std::process::ExitCode;

/// List stored schemes
#[derive(Args, Debug)]
pub struct SchemesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SchemesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing schemes command");

        let repository = open_repository(config)?;
        let records = repository.all().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(ExitCode::SUCCESS);
        }

        if records.is_empty() {
            println!("No schemes stored. Run 'sanchar seed' to load the sample schemes.");
            return Ok(ExitCode::SUCCESS);
        }

        for record in &records {
            println!("{}. {} [{}]", record.id, record.name, record.category);
            println!("   {}", record.localized_summary);
        }
        println!("\n{} schemes", records.len());

        Ok(ExitCode::SUCCESS)
    }
}
