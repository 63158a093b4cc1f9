use super::{SchemeQuery, SchemeRepository};
use chrono::Utc;
use sanchar_core::{AppError, AppResult, NewScheme, SchemeRecord};
use std::sync::RwLock;

/// Process-local scheme store, mainly for tests and dry runs.
#[derive(Default)]
pub struct InMemorySchemeRepository {
    records: RwLock<Vec<SchemeRecord>>,
}

impl InMemorySchemeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `schemes` in the given order.
    pub fn from_schemes(schemes: Vec<NewScheme>) -> AppResult<Self> {
        let repo = Self::new();
        for scheme in schemes {
            repo.insert(scheme)?;
        }
        Ok(repo)
    }

    /// Validate and append one scheme.
    pub fn insert(&self, scheme: NewScheme) -> AppResult<SchemeRecord> {
        let scheme = scheme.validated()?;
        let mut records = self
            .records
            .write()
            .map_err(|_| AppError::Storage("Scheme store lock poisoned".to_string()))?;

        let now = Utc::now();
        let record = SchemeRecord {
            id: records.last().map(|r| r.id + 1).unwrap_or(1),
            name: scheme.name,
            category: scheme.category,
            eligibility: scheme.eligibility,
            benefits: scheme.benefits,
            how_to_apply: scheme.how_to_apply,
            keywords: scheme.keywords,
            localized_summary: scheme.localized_summary,
            created_at: now,
            updated_at: now,
        };

        records.push(record.clone());
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SchemeRepository for InMemorySchemeRepository {
    async fn find(&self, query: &SchemeQuery) -> AppResult<Vec<SchemeRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| AppError::Storage("Scheme store lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|record| query.matches(record))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn all(&self) -> AppResult<Vec<SchemeRecord>> {
        self.records
            .read()
            .map(|records| records.clone())
            .map_err(|_| AppError::Storage("Scheme store lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_schemes;
    use sanchar_core::MatchPolicy;

    #[tokio::test]
    async fn test_find_matches_sqlite_semantics() {
        let repo = InMemorySchemeRepository::from_schemes(sample_schemes()).unwrap();
        assert_eq!(repo.len(), 5);

        let query = SchemeQuery::new("PM-Kisan", MatchPolicy::Legacy.fields(), 3);
        let records = repo.find(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 3);
    }

    #[tokio::test]
    async fn test_limit_zero_returns_nothing() {
        let repo = InMemorySchemeRepository::from_schemes(sample_schemes()).unwrap();
        let query = SchemeQuery::new("योजना", MatchPolicy::Extended.fields(), 0);
        assert!(repo.find(&query).await.unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_scheme() {
        let repo = InMemorySchemeRepository::new();
        let mut scheme = sample_schemes().remove(0);
        scheme.name = "  ".to_string();

        assert!(repo.insert(scheme).is_err());
        assert!(repo.is_empty());
    }
}
