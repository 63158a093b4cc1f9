//! Error types for Bharat Sanchar.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation, storage, prompt,
//! delivery and validation errors.

use thiserror::Error;

/// Unified error type for Bharat Sanchar.
///
/// Library functions return `Result<T, AppError>`. The answer pipeline
/// converts these into a typed outcome before they reach a caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generator (LLM provider) errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Scheme store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// SMS delivery errors
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// A value violated a data model invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = AppError::Storage("connection refused".to_string());
        assert_eq!(err.to_string(), "Storage error: connection refused");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
