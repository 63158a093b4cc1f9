//! Command handlers for the Bharat Sanchar CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod schemes;
pub mod seed;
pub mod sms;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use schemes::SchemesCommand;
pub use seed::SeedCommand;
pub use sms::SmsCommand;

use sanchar_core::{config::AppConfig, AppError, AppResult};
use sanchar_prompt::{find_templates, PromptComposer, DEFAULT_TEMPLATE_ID};
use sanchar_schemes::{AnswerPipeline, GenerationSettings, SqliteSchemeRepository, SubstringStrategy};
use std::sync::Arc;

/// Open the scheme store named by the configuration.
pub(crate) fn open_repository(config: &AppConfig) -> AppResult<SqliteSchemeRepository> {
    let path = config.database_path();
    tracing::debug!("Scheme database: {:?}", path);
    SqliteSchemeRepository::open(&path)
}

/// Prompt composer for the configured language, honoring a workspace
/// template override.
pub(crate) fn build_composer(config: &AppConfig) -> AppResult<PromptComposer> {
    let language = config.answer.language.clone();
    match find_templates(&config.workspace, DEFAULT_TEMPLATE_ID)? {
        Some(templates) => PromptComposer::with_templates(language, templates),
        None => Ok(PromptComposer::new(language)),
    }
}

/// Wire the answer pipeline from configuration.
pub(crate) fn build_pipeline(
    config: &AppConfig,
    repository: Arc<SqliteSchemeRepository>,
) -> AppResult<AnswerPipeline> {
    config.validate()?;

    let endpoint = config.resolve_endpoint(&config.provider);
    let api_key = config.resolve_api_key(&config.provider);

    let generator = sanchar_llm::create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())
        .map_err(AppError::Config)?;

    let settings = GenerationSettings::new(&config.model)
        .with_temperature(config.answer.temperature)
        .with_max_tokens(config.answer.max_tokens);

    let strategy = SubstringStrategy::new(config.retrieval.match_policy, config.retrieval.top_k);

    Ok(AnswerPipeline::new(repository, generator, build_composer(config)?, settings)
        .with_strategy(Arc::new(strategy)))
}
