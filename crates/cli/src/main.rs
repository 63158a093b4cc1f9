//! Bharat Sanchar CLI
//!
//! Main entry point for the sanchar command-line tool.
//! Answers questions about Indian government welfare schemes, optionally
//! delivering the answer by SMS.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, SchemesCommand, SeedCommand, SmsCommand};
use sanchar_core::{config::AppConfig, logging};
use std::path::PathBuf;
use std::process::ExitCode;

/// Bharat Sanchar - welfare scheme answers grounded in a local scheme store
#[derive(Parser, Debug)]
#[command(name = "sanchar")]
#[command(about = "Answers questions about Indian welfare schemes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SANCHAR_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SANCHAR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generator provider (gemini, ollama)
    #[arg(short, long, global = true, env = "SANCHAR_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "SANCHAR_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question about welfare schemes
    Ask(AskCommand),

    /// List stored schemes
    Schemes(SchemesCommand),

    /// Load schemes into the store
    Seed(SeedCommand),

    /// Send a text message
    Sms(SmsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)
        .context("Failed to initialize logging")?;

    tracing::info!("Bharat Sanchar CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_sanchar_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Schemes(_) => "schemes",
        Commands::Seed(_) => "seed",
        Commands::Sms(_) => "sms",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Schemes(cmd) => cmd.execute(&config).await,
        Commands::Seed(cmd) => cmd.execute(&config).await,
        Commands::Sms(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_sms() {
        let cli = Cli::try_parse_from([
            "sanchar",
            "ask",
            "जन धन योजना क्या है?",
            "--sms",
            "+919800000000",
            "--timeout-secs",
            "20",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question, "जन धन योजना क्या है?");
                assert_eq!(cmd.sms.as_deref(), Some("+919800000000"));
                assert_eq!(cmd.timeout_secs, Some(20));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_seed_file_conflicts_with_dir() {
        let result = Cli::try_parse_from([
            "sanchar", "seed", "--file", "a.yml", "--dir", "seeds",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sanchar", "schemes", "--json", "--provider", "ollama"])
            .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("ollama"));
    }
}
