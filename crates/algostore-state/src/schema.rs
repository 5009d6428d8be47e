//! Entity records for the algorithm store.
//!
//! An `AlgorithmRecord` is a registered federated-computation container
//! entry. Its `digest` binds the mutable image reference to immutable
//! content; its `status` is only ever mutated as a side effect of review
//! lifecycle events, never set directly by a client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for an algorithm entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlgorithmId(pub String);

impl AlgorithmId {
    /// Generate a new random AlgorithmId
    pub fn new() -> Self {
        AlgorithmId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AlgorithmId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a review
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl ReviewId {
    /// Generate a new random ReviewId
    pub fn new() -> Self {
        ReviewId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a principal (developer or reviewer) as assigned by the
/// authentication layer. Equality on this id is the developer-identity
/// check used by the review guards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ImageDigest
// ---------------------------------------------------------------------------

/// Content-addressable image identifier (`sha256:` + 64 hex chars).
///
/// The inner field is private to guarantee the string is always a valid
/// digest produced by `from_bytes`/`from_hex` or validated via
/// `TryFrom<String>`. Once stored on an algorithm it is never re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDigest(String);

impl ImageDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(data);
        ImageDigest(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    /// Wrap a bare 64-char hex string as a digest.
    pub fn from_hex(hex: &str) -> Result<Self, StorageError> {
        if !is_hex_digest(hex) {
            return Err(StorageError::InvalidDigest {
                digest: hex.to_string(),
            });
        }
        Ok(ImageDigest(format!("sha256:{}", hex.to_ascii_lowercase())))
    }

    /// Return the full `sha256:<hex>` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (`sha256:` + first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..19.min(self.0.len())]
    }
}

impl TryFrom<String> for ImageDigest {
    type Error = StorageError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.strip_prefix("sha256:") {
            Some(hex) if is_hex_digest(hex) => Ok(ImageDigest(s)),
            _ => Err(StorageError::InvalidDigest { digest: s }),
        }
    }
}

impl std::fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether `s` is a 64-character hexadecimal string.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Review state of an algorithm entry.
///
/// Transitions are driven exclusively by review lifecycle events:
/// AwaitingReviewerAssignment → UnderReview → {Approved, Rejected};
/// Replaced marks an entry superseded by a re-registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmStatus {
    AwaitingReviewerAssignment,
    UnderReview,
    Approved,
    Rejected,
    Replaced,
}

impl AlgorithmStatus {
    /// Whether the review process has reached a terminal verdict.
    pub fn is_finished(&self) -> bool {
        matches!(self, AlgorithmStatus::Approved | AlgorithmStatus::Rejected)
    }
}

/// State of a single reviewer's verdict.
///
/// Dropped marks a review made obsolete by a sibling's rejection; it can
/// never return to UnderReview, so a closed decision cannot be resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    UnderReview,
    Approved,
    Rejected,
    Dropped,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A registered algorithm container entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmRecord {
    pub id: AlgorithmId,
    /// Mutable image reference, e.g. `registry/repo:tag`. Rewritten to its
    /// tag-stripped form once the digest is resolved.
    pub image: String,
    /// Immutable content identity. Null until the assignment worker has
    /// resolved it; frozen once the algorithm is approved.
    pub digest: Option<ImageDigest>,
    pub status: AlgorithmStatus,
    /// Set when the entry is rejected or replaced.
    pub invalidated_at: Option<DateTime<Utc>>,
    /// Owning principal; may not review their own entry.
    pub developer: PrincipalId,
    pub created_at: DateTime<Utc>,
}

impl AlgorithmRecord {
    /// Create a fresh, unreviewed entry for the given image reference.
    pub fn new(image: &str, developer: PrincipalId) -> Self {
        AlgorithmRecord {
            id: AlgorithmId::new(),
            image: image.to_string(),
            digest: None,
            status: AlgorithmStatus::AwaitingReviewerAssignment,
            invalidated_at: None,
            developer,
            created_at: Utc::now(),
        }
    }
}

/// One reviewer's verdict on one algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub algorithm_id: AlgorithmId,
    pub reviewer: PrincipalId,
    pub status: ReviewStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Create a pending review assigning `reviewer` to `algorithm_id`.
    pub fn new(algorithm_id: AlgorithmId, reviewer: PrincipalId) -> Self {
        ReviewRecord {
            id: ReviewId::new(),
            algorithm_id,
            reviewer,
            status: ReviewStatus::UnderReview,
            comment: None,
            created_at: Utc::now(),
        }
    }
}
