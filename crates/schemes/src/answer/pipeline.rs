//! Answer orchestration.
//!
//! One call walks `Idle → Validating → Retrieving → Composing → Generating`
//! and ends in `Succeeded` or `Failed`. Each stage is a value of [`Stage`];
//! [`AnswerPipeline::step`] maps a stage to the next one. Collaborator
//! errors are classified where they occur and never leave the pipeline.

use super::outcome::{AnswerOutcome, FailureKind};
use crate::retrieval::{RelevanceStrategy, RetrievalResult, SubstringStrategy};
use crate::store::SchemeRepository;
use futures::FutureExt;
use sanchar_llm::{LlmClient, LlmRequest};
use sanchar_prompt::{ComposedPrompt, PromptComposer};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Observable pipeline state, used in transition logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Validating,
    Retrieving,
    Composing,
    Generating,
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Retrieving => "retrieving",
            Self::Composing => "composing",
            Self::Generating => "generating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Generator parameters applied to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request(&self, prompt: ComposedPrompt) -> LlmRequest {
        let mut request =
            LlmRequest::new(prompt.user_prompt, &self.model).with_system(prompt.system_instruction);

        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }
}

enum Stage<'q> {
    Validating { query: &'q str },
    Retrieving { query: &'q str },
    Composing { query: &'q str, retrieved: RetrievalResult },
    Generating { prompt: ComposedPrompt },
    Finished(AnswerOutcome),
}

impl Stage<'_> {
    fn state(&self) -> PipelineState {
        match self {
            Self::Validating { .. } => PipelineState::Validating,
            Self::Retrieving { .. } => PipelineState::Retrieving,
            Self::Composing { .. } => PipelineState::Composing,
            Self::Generating { .. } => PipelineState::Generating,
            Self::Finished(outcome) if outcome.is_success() => PipelineState::Succeeded,
            Self::Finished(_) => PipelineState::Failed,
        }
    }
}

/// Answers welfare-scheme questions grounded in the scheme store.
///
/// The pipeline holds no per-call state, so one instance can serve any
/// number of concurrent calls.
///
/// # Example
/// ```no_run
/// use sanchar_llm::create_client;
/// use sanchar_prompt::PromptComposer;
/// use sanchar_schemes::{AnswerPipeline, GenerationSettings, SqliteSchemeRepository};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = Arc::new(SqliteSchemeRepository::open(Path::new(".sanchar/schemes.sqlite"))?);
/// let generator = create_client("ollama", None, None)?;
/// let pipeline = AnswerPipeline::new(
///     repository,
///     generator,
///     PromptComposer::new("Hindi"),
///     GenerationSettings::new("llama3.2"),
/// );
///
/// let outcome = pipeline.answer("जन धन योजना क्या है?").await;
/// println!("{}", outcome.user_text());
/// # Ok(())
/// # }
/// ```
pub struct AnswerPipeline {
    repository: Arc<dyn SchemeRepository>,
    generator: Arc<dyn LlmClient>,
    composer: PromptComposer,
    strategy: Arc<dyn RelevanceStrategy>,
    settings: GenerationSettings,
}

impl AnswerPipeline {
    pub fn new(
        repository: Arc<dyn SchemeRepository>,
        generator: Arc<dyn LlmClient>,
        composer: PromptComposer,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            repository,
            generator,
            composer,
            strategy: Arc::new(SubstringStrategy::default()),
            settings,
        }
    }

    /// Replace the relevance strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn RelevanceStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Answer `query`. Never returns an unclassified error.
    pub async fn answer(&self, query: &str) -> AnswerOutcome {
        let span = tracing::info_span!(
            "answer",
            strategy = self.strategy.name(),
            generator = self.generator.provider_name()
        );

        async move {
            let mut stage = Stage::Validating { query };
            log_transition(PipelineState::Idle, &stage);

            loop {
                stage = match stage {
                    Stage::Finished(outcome) => return outcome,
                    current => {
                        let from = current.state();
                        let next = self.step(current).await;
                        log_transition(from, &next);
                        next
                    }
                };
            }
        }
        .instrument(span)
        .await
    }

    /// Answer `query`, giving up once `deadline` has elapsed.
    ///
    /// On expiry the pending store or generator call is dropped and the
    /// outcome is an `UnexpectedFailure`.
    pub async fn answer_within(&self, query: &str, deadline: Duration) -> AnswerOutcome {
        match tokio::time::timeout(deadline, self.answer(query)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("Answer deadline of {:?} elapsed", deadline);
                AnswerOutcome::failure(
                    FailureKind::UnexpectedFailure,
                    Some(format!("deadline of {:?} elapsed", deadline)),
                )
            }
        }
    }

    async fn step<'q>(&self, stage: Stage<'q>) -> Stage<'q> {
        match stage {
            Stage::Validating { query } => validate(query),
            Stage::Retrieving { query } => self.retrieve(query).await,
            Stage::Composing { query, retrieved } => Stage::Generating {
                prompt: self.composer.compose(query, &retrieved),
            },
            Stage::Generating { prompt } => self.generate(prompt).await,
            finished @ Stage::Finished(_) => finished,
        }
    }

    async fn retrieve<'q>(&self, query: &'q str) -> Stage<'q> {
        let selection = AssertUnwindSafe(self.strategy.select(query, self.repository.as_ref()))
            .catch_unwind()
            .await;

        match selection {
            Ok(Ok(retrieved)) => {
                tracing::info!(
                    "Retrieved {} schemes: {:?}",
                    retrieved.len(),
                    retrieved.names()
                );
                Stage::Composing { query, retrieved }
            }
            Ok(Err(e)) => {
                tracing::error!("Scheme retrieval failed: {}", e);
                Stage::Finished(AnswerOutcome::failure(
                    FailureKind::RetrievalUnavailable,
                    Some(e.to_string()),
                ))
            }
            Err(payload) => Stage::Finished(panicked("retrieval", payload)),
        }
    }

    async fn generate<'q>(&self, prompt: ComposedPrompt) -> Stage<'q> {
        tracing::debug!(
            template = %prompt.metadata.template_id,
            schemes = prompt.metadata.schemes_included,
            "Requesting completion"
        );

        let request = self.settings.request(prompt);
        let completion = AssertUnwindSafe(self.generator.complete(&request))
            .catch_unwind()
            .await;

        match completion {
            Ok(Ok(response)) => Stage::Finished(AnswerOutcome::success(response.content)),
            Ok(Err(e)) => {
                tracing::error!("Generation failed: {}", e);
                Stage::Finished(AnswerOutcome::failure(
                    FailureKind::GenerationFailed,
                    Some(e.to_string()),
                ))
            }
            Err(payload) => Stage::Finished(panicked("generation", payload)),
        }
    }
}

fn validate(query: &str) -> Stage<'_> {
    if query.trim().is_empty() {
        Stage::Finished(AnswerOutcome::failure(FailureKind::InvalidInput, None))
    } else {
        Stage::Retrieving { query }
    }
}

fn log_transition(from: PipelineState, to: &Stage<'_>) {
    tracing::debug!(%from, to = %to.state(), "Pipeline transition");
}

fn panicked(during: &str, payload: Box<dyn Any + Send>) -> AnswerOutcome {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    tracing::error!("Panic during {}: {}", during, reason);

    AnswerOutcome::failure(
        FailureKind::UnexpectedFailure,
        Some(format!("panic during {}: {}", during, reason)),
    )
}
