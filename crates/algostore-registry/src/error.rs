//! Error types for algostore-registry

use thiserror::Error;

/// Errors that can occur while resolving an image digest
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Image string has no parseable repository/tag split
    #[error("Invalid image reference: {reference}")]
    InvalidReference { reference: String },

    /// Registry returned 404 for the manifest
    #[error("Image {repository}:{tag} from registry {registry} not found")]
    ImageNotFound {
        registry: String,
        repository: String,
        tag: String,
    },

    /// Any other non-2xx response, transport failure or unparseable
    /// authentication challenge. Carries the failing URL.
    #[error("Registry protocol error at {url}: {reason}")]
    Protocol { url: String, reason: String },

    /// Manifest body could not be serialized for hashing
    #[error("Manifest serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
