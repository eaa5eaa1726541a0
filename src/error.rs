//! Error types for reportforge subsystems.
//!
//! Defines error types for the external collaborators the pipeline consumes:
//! - Text-generation API interactions
//! - Semantic retrieval lookups
//! - Result persistence

use thiserror::Error;

/// Errors that can occur during text-generation operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: REPORTFORGE_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Generation response contained no choices")]
    EmptyResponse,

    #[error("Failed to parse generation response: {0}")]
    ParseError(String),
}

/// Errors that can occur during semantic retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval query failed: {0}")]
    QueryFailed(String),

    #[error("Index update failed: {0}")]
    IndexFailed(String),
}

/// Errors that can occur while persisting or loading pipeline runs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record '{0}' not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
