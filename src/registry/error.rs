//! Registry error types

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown module in registry config: {0}")]
    UnknownModule(String),

    #[error("Model not found: {0}")]
    UnknownModel(String),

    #[error("Ambiguous model name '{name}': matches {candidates}")]
    AmbiguousName { name: String, candidates: String },
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
