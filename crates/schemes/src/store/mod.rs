//! Scheme storage.
//!
//! The answer pipeline only reads through [`SchemeRepository`]. Writes are
//! reserved for the seeding process and live on the concrete stores.

mod memory;
mod sqlite;

pub use memory::InMemorySchemeRepository;
pub use sqlite::SqliteSchemeRepository;

use sanchar_core::{AppResult, SchemeField, SchemeRecord};

/// Case-insensitive substring predicate over a named field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeQuery {
    /// Text that must appear in at least one field, matched literally
    pub needle: String,

    /// Fields searched for the needle
    pub fields: Vec<SchemeField>,

    /// Maximum number of records returned
    pub limit: usize,
}

impl SchemeQuery {
    pub fn new(needle: impl Into<String>, fields: &[SchemeField], limit: usize) -> Self {
        Self {
            needle: needle.into(),
            fields: fields.to_vec(),
            limit,
        }
    }

    /// Whether `record` satisfies the predicate.
    pub fn matches(&self, record: &SchemeRecord) -> bool {
        self.fields
            .iter()
            .any(|field| contains_ci(record.field(*field), &self.needle))
    }
}

/// Unicode-aware case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Read access to the scheme collection.
///
/// Implementations must return matches in insertion order.
#[async_trait::async_trait]
pub trait SchemeRepository: Send + Sync {
    /// Records satisfying `query`, oldest first, at most `query.limit`.
    async fn find(&self, query: &SchemeQuery) -> AppResult<Vec<SchemeRecord>>;

    /// Every stored record, oldest first.
    async fn all(&self) -> AppResult<Vec<SchemeRecord>>;
}
