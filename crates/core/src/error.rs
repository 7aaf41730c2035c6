//! Error types for DocQA.
//!
//! One enum covers the whole application. The question-answering variants
//! (`InvalidConfiguration` through `UnknownDocument`) are the pipeline's
//! failure taxonomy; the rest are ambient concerns (config, I/O, prompts).

use thiserror::Error;

/// Unified error type for DocQA.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad chunking or index parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller passed an argument outside the accepted domain (e.g. `k == 0`)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A document could not be read, fetched or parsed
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    /// Embedding service unavailable, timed out, or returned malformed vectors
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// LLM call made by the router failed or timed out
    #[error("Routing service error: {0}")]
    RoutingService(String),

    /// LLM call made by the reasoner failed or timed out
    #[error("Reasoning service error: {0}")]
    ReasoningService(String),

    /// Registry lookup for an id the router should never have produced
    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    /// Application configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

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
