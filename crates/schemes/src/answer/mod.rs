//! The answer pipeline and its typed outcome.

pub mod outcome;
pub mod pipeline;

pub use outcome::{AnswerOutcome, FailureKind};
pub use pipeline::{AnswerPipeline, GenerationSettings, PipelineState};
