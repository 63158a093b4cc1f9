use sanchar_core::SchemeRecord;
use serde::Serialize;
use std::ops::Deref;

/// Schemes chosen for one question, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    records: Vec<SchemeRecord>,
}

impl RetrievalResult {
    pub fn new(records: Vec<SchemeRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Scheme names, for logging.
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}

impl Deref for RetrievalResult {
    type Target = [SchemeRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}
