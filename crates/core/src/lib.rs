//! Bharat Sanchar Core Library
//!
//! This crate provides the foundational pieces shared by every other crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Generator provider identification
//! - The scheme record data model

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod scheme;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use provider::ProviderType;
pub use scheme::{MatchPolicy, NewScheme, SchemeField, SchemeRecord};
