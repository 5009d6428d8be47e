//! Error types for algorithm and review lifecycle operations

use thiserror::Error;

use algostore_registry::RegistryError;
use algostore_state::{AlgorithmId, ReviewId, StorageError};

/// Errors surfaced by the lifecycle services.
///
/// All review-mutation validation errors are raised before any write, so a
/// failed request leaves both the algorithm and its reviews untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Target algorithm does not exist
    #[error("Algorithm not found: {0}")]
    AlgorithmNotFound(AlgorithmId),

    /// Target review does not exist
    #[error("Review not found: {0}")]
    ReviewNotFound(ReviewId),

    /// Review creation attempted on an algorithm whose review is finished
    #[error("Review of algorithm {0} is already finished")]
    AlgorithmAlreadyReviewed(AlgorithmId),

    /// Duplicate/self/unauthorized review mutation, or deletion of a review
    /// on an approved algorithm
    #[error("Review conflict: {0}")]
    ReviewConflict(String),

    /// An approval would finish the review while the digest is still
    /// unresolved; approval is refused so approved entries always carry a
    /// content identity
    #[error("Algorithm {0} has no resolved digest yet")]
    DigestUnresolved(AlgorithmId),

    /// Digest resolution failure (asynchronous, non-fatal to registration)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Entity store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, StoreError>;
