//! Error types for the Binh Dinh travel assistant.
//!
//! This module defines a unified error enum covering all error
//! categories: configuration, I/O, embedding, search, generation,
//! and cancellation.

use thiserror::Error;

/// Unified error type for the application.
///
/// All functions return `Result<T, AppError>`. We never panic —
/// errors must be represented and propagated. User-facing failure
/// text lives in the pipeline crate; these variants carry the
/// diagnostic detail.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query embedding errors (vectorization service)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document search errors, including empty-result conditions
    #[error("Search error: {0}")]
    Search(String),

    /// Language-model generation errors, including deadline overrun
    #[error("Generation error: {0}")]
    Generation(String),

    /// The invocation's cancellation signal was observed
    #[error("operation cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error stems from the cancellation signal.
    ///
    /// Retrieval errors are normally absorbed by the orchestrator,
    /// but a cancelled retrieval is terminal for the invocation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
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
    fn test_is_cancelled() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::Search("no hits".to_string()).is_cancelled());
        assert!(!AppError::Generation("timeout".to_string()).is_cancelled());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Search("no results".to_string());
        assert_eq!(err.to_string(), "Search error: no results");

        let err = AppError::Cancelled;
        assert_eq!(err.to_string(), "operation cancelled");
    }
}
