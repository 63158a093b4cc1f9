//! Scheme store, relevance selection and the answer pipeline.
//!
//! The pipeline takes a raw question, selects matching schemes from a
//! [`SchemeRepository`](store::SchemeRepository), composes a grounded
//! prompt and asks the generator for an answer. Every failure is
//! classified into an [`AnswerOutcome`](answer::AnswerOutcome).

pub mod answer;
pub mod retrieval;
pub mod seed;
pub mod store;


// Re-export commonly used types
pub use answer::{AnswerOutcome, AnswerPipeline, FailureKind, GenerationSettings, PipelineState};
pub use retrieval::{RelevanceStrategy, RetrievalResult, SubstringStrategy};
pub use seed::{load_seed_dir, load_seed_file, sample_schemes, seed, SeedStats};
pub use store::{
    InMemorySchemeRepository, SchemeQuery, SchemeRepository, SqliteSchemeRepository,
};
