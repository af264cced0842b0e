//! Error types for the docrag pipeline
//!
//! Every stage surfaces its failures unmodified to the caller with enough
//! context to tell which external dependency failed. No stage recovers
//! locally and no partial answers are produced.

use thiserror::Error;

/// Main error type for the RAG pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Document source could not be fetched or was empty
    #[error("Document source unavailable ({source_desc}): {reason}")]
    SourceUnavailable { source_desc: String, reason: String },

    /// Embedding service failures; `stage` names the failing unit
    /// ("fragment 3", "query", ...)
    #[error("Embedding service error ({stage}): {message}")]
    EmbeddingService { stage: String, message: String },

    /// Search was attempted against an index with no entries
    #[error("Cannot search an empty index")]
    EmptyIndex,

    /// Requested top-k is zero or exceeds the index size
    #[error("Invalid top-k {k}: index holds {index_size} fragments")]
    InvalidTopK { k: usize, index_size: usize },

    /// Generation service failures (connect, non-success status, timeout)
    #[error("Generation service error: {message}")]
    GenerationService { message: String },

    /// A vector's length does not match the index dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;
