//! Relevance selection.
//!
//! A [`RelevanceStrategy`] turns a question into the schemes used to ground
//! the answer. The default [`SubstringStrategy`] returns the first `K`
//! stored schemes whose text contains the question, in insertion order.

pub mod substring;
pub mod types;

pub use substring::SubstringStrategy;
pub use types::RetrievalResult;

use crate::store::SchemeRepository;
use sanchar_core::AppResult;

/// Chooses which schemes ground an answer.
#[async_trait::async_trait]
pub trait RelevanceStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Select schemes relevant to `query`.
    ///
    /// Returns an empty result for an empty or whitespace-only query and
    /// a storage error when the repository cannot be read.
    async fn select(
        &self,
        query: &str,
        repository: &dyn SchemeRepository,
    ) -> AppResult<RetrievalResult>;
}
