//! Seed command handler.

use super::open_repository;
use clap::Args;
use sanchar_core::{config::AppConfig, AppResult};
use sanchar_schemes::{load_seed_dir, load_seed_file, sample_schemes, seed};
use std::path::PathBuf;
use std::process::ExitCode;

/// Load schemes into the store
///
/// Without --file or --dir the built-in sample schemes are loaded.
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Seed file (.yml, .yaml or .json)
    #[arg(long, conflicts_with = "dir")]
    pub file: Option<PathBuf>,

    /// Directory of seed files
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Delete existing schemes first
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SeedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing seed command");

        let schemes = match (&self.file, &self.dir) {
            (Some(file), _) => load_seed_file(file)?,
            (None, Some(dir)) => load_seed_dir(dir)?,
            (None, None) => sample_schemes(),
        };

        let repository = open_repository(config)?;
        let stats = seed(&repository, schemes, self.reset)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Seeded {} schemes ({} total) in {:.2}s",
                stats.inserted, stats.total, stats.duration_secs
            );
        }

        Ok(ExitCode::SUCCESS)
    }
}
