//! Error types for algostore-state

use thiserror::Error;

/// Errors that can occur in the entity persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Algorithm record not found
    #[error("Algorithm not found: {id}")]
    AlgorithmNotFound { id: String },

    /// Review record not found
    #[error("Review not found: {id}")]
    ReviewNotFound { id: String },

    /// Digest string is not `sha256:` followed by 64 hex characters
    #[error("Invalid image digest: {digest}")]
    InvalidDigest { digest: String },

    /// Backend query error
    #[error("Store query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
