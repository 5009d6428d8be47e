//! Store trait definitions for the algorithm store
//!
//! These traits define the entity persistence abstractions consumed by the
//! lifecycle services:
//! - `AlgorithmStore`: algorithm entries (get/save/delete/list)
//! - `ReviewStore`: review records with filtered queries
//!
//! All traits are async and backend-agnostic, with read-after-write
//! consistency within one logical call. In-memory fakes are provided for
//! testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{
    AlgorithmId, AlgorithmRecord, PrincipalId, ReviewId, ReviewRecord, ReviewStatus,
};

/// Result type for store operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// AlgorithmStore
// ---------------------------------------------------------------------------

/// Persistence for algorithm entries.
///
/// Guarantees:
/// - `save` is an upsert keyed on `record.id`.
/// - `get` after `save` returns the saved record.
#[async_trait]
pub trait AlgorithmStore: Send + Sync {
    /// Retrieve an algorithm by id, `None` if absent.
    async fn get(&self, id: &AlgorithmId) -> StorageResult<Option<AlgorithmRecord>>;

    /// Insert or update an algorithm record.
    async fn save(&self, record: &AlgorithmRecord) -> StorageResult<()>;

    /// Delete an algorithm by id. No-op if absent.
    async fn delete(&self, id: &AlgorithmId) -> StorageResult<()>;

    /// List all algorithm records.
    async fn list(&self) -> StorageResult<Vec<AlgorithmRecord>>;
}

// ---------------------------------------------------------------------------
// ReviewStore
// ---------------------------------------------------------------------------

/// Status filter for review queries. `Reviewed` matches both Approved and
/// Rejected reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatusFilter {
    UnderReview,
    Reviewed,
    Approved,
    Rejected,
}

impl ReviewStatusFilter {
    fn matches(&self, status: ReviewStatus) -> bool {
        match self {
            ReviewStatusFilter::UnderReview => status == ReviewStatus::UnderReview,
            ReviewStatusFilter::Reviewed => {
                matches!(status, ReviewStatus::Approved | ReviewStatus::Rejected)
            }
            ReviewStatusFilter::Approved => status == ReviewStatus::Approved,
            ReviewStatusFilter::Rejected => status == ReviewStatus::Rejected,
        }
    }
}

/// Filter for review queries. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub algorithm_id: Option<AlgorithmId>,
    pub reviewer: Option<PrincipalId>,
    pub status: Option<ReviewStatusFilter>,
}

impl ReviewFilter {
    /// Filter matching all reviews of one algorithm.
    pub fn for_algorithm(algorithm_id: &AlgorithmId) -> Self {
        ReviewFilter {
            algorithm_id: Some(algorithm_id.clone()),
            ..Default::default()
        }
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, record: &ReviewRecord) -> bool {
        if let Some(algorithm_id) = &self.algorithm_id {
            if record.algorithm_id != *algorithm_id {
                return false;
            }
        }
        if let Some(reviewer) = &self.reviewer {
            if record.reviewer != *reviewer {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if !status.matches(record.status) {
                return false;
            }
        }
        true
    }
}

/// Persistence for review records.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Retrieve a review by id, `None` if absent.
    async fn get(&self, id: &ReviewId) -> StorageResult<Option<ReviewRecord>>;

    /// Insert or update a review record.
    async fn save(&self, record: &ReviewRecord) -> StorageResult<()>;

    /// Delete a review by id. No-op if absent.
    async fn delete(&self, id: &ReviewId) -> StorageResult<()>;

    /// List reviews matching the filter.
    async fn list(&self, filter: &ReviewFilter) -> StorageResult<Vec<ReviewRecord>>;
}
