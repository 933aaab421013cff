//! Error types for the recall core library.

use recall_llm::LlmError;
use thiserror::Error;

/// Top-level error type for memory operations.
#[derive(Error, Debug)]
pub enum RecallError {
    /// An LLM or embedding call failed outright.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A memory reached the store (or a similarity computation) without an embedding.
    #[error("Memory has no embedding: {description}")]
    MissingEmbedding {
        /// Description of the offending memory.
        description: String,
    },

    /// The importance rating protocol produced no digit.
    #[error("Importance rating unavailable for memory: {description}")]
    RatingUnavailable {
        /// Description of the memory that could not be rated.
        description: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RecallError>;
