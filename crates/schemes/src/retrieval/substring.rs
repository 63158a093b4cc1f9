use super::{RelevanceStrategy, RetrievalResult};
use crate::store::{SchemeQuery, SchemeRepository};
use sanchar_core::{AppResult, MatchPolicy, SchemeField, SchemeRecord};

/// Default number of schemes used to ground an answer.
pub const DEFAULT_TOP_K: usize = 3;

/// Literal case-insensitive substring match over a field set.
///
/// Results are the first `top_k` groundable matches in insertion order.
/// There is no ranking: a weak match stored early wins over a strong one
/// stored late. When matches without a summary crowd the first page, the
/// repository is asked again with a doubled limit until `top_k` groundable
/// records are found or the matches run out.
#[derive(Debug, Clone)]
pub struct SubstringStrategy {
    fields: Vec<SchemeField>,
    top_k: usize,
}

impl SubstringStrategy {
    pub fn new(policy: MatchPolicy, top_k: usize) -> Self {
        Self::with_fields(policy.fields(), top_k)
    }

    /// Match against an explicit field list.
    pub fn with_fields(fields: &[SchemeField], top_k: usize) -> Self {
        Self {
            fields: fields.to_vec(),
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn fields(&self) -> &[SchemeField] {
        &self.fields
    }
}

impl Default for SubstringStrategy {
    fn default() -> Self {
        Self::new(MatchPolicy::default(), DEFAULT_TOP_K)
    }
}

#[async_trait::async_trait]
impl RelevanceStrategy for SubstringStrategy {
    fn name(&self) -> &str {
        "substring"
    }

    async fn select(
        &self,
        query: &str,
        repository: &dyn SchemeRepository,
    ) -> AppResult<RetrievalResult> {
        let needle = query.trim();
        if needle.is_empty() || self.top_k == 0 {
            return Ok(RetrievalResult::empty());
        }

        let mut limit = self.top_k;
        let records: Vec<SchemeRecord> = loop {
            let fetched = repository
                .find(&SchemeQuery::new(needle, &self.fields, limit))
                .await?;
            let exhausted = fetched.len() < limit;

            let groundable: Vec<SchemeRecord> = fetched
                .into_iter()
                .filter(SchemeRecord::is_groundable)
                .take(self.top_k)
                .collect();

            if groundable.len() == self.top_k || exhausted {
                break groundable;
            }

            tracing::debug!(limit, "Matches without a summary skipped, widening the page");
            limit = limit.saturating_mul(2);
        };

        tracing::debug!(
            strategy = self.name(),
            "Selected {} of at most {} schemes",
            records.len(),
            self.top_k
        );

        Ok(RetrievalResult::new(records))
    }
}
