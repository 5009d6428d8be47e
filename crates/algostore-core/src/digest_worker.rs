//! Off-path digest assignment
//!
//! Resolves and persists an algorithm's image digest without blocking the
//! registration caller. The worker is handed only the algorithm id and the
//! image reference; it re-fetches the record from storage at execution
//! time, so a stale in-memory record can never be written back. The digest
//! field has a single writer: this worker (the pinned-digest short-circuit
//! runs through it as well).

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use algostore_registry::{resolve_digest, ManifestFetcher};
use algostore_state::{AlgorithmId, AlgorithmStore, ImageDigest};

use crate::error::{Result, StoreError};

/// Resolves image digests off the request path.
#[derive(Clone)]
pub struct DigestAssignmentWorker {
    algorithms: Arc<dyn AlgorithmStore>,
    fetcher: Arc<dyn ManifestFetcher>,
}

impl DigestAssignmentWorker {
    pub fn new(algorithms: Arc<dyn AlgorithmStore>, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        DigestAssignmentWorker {
            algorithms,
            fetcher,
        }
    }

    /// Detach digest assignment onto the runtime. The triggering request
    /// must never await the returned handle; a resolution that never
    /// returns blocks only this task, not the caller.
    pub fn spawn(&self, algorithm_id: AlgorithmId, image: String) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move {
            worker.assign(&algorithm_id, &image).await;
        })
    }

    /// Resolve and persist the digest for one algorithm. Failures are
    /// logged and leave the digest null; there is no retry loop, recovery
    /// is an explicit refresh.
    pub async fn assign(&self, algorithm_id: &AlgorithmId, image: &str) {
        match self.try_assign(algorithm_id, image).await {
            Ok(digest) => {
                info!(
                    "Stored digest {} for algorithm {}",
                    digest.short(),
                    algorithm_id
                );
            }
            Err(e) => {
                warn!(
                    "Could not determine digest for algorithm {}: {}",
                    algorithm_id, e
                );
            }
        }
    }

    async fn try_assign(&self, algorithm_id: &AlgorithmId, image: &str) -> Result<ImageDigest> {
        let resolved = resolve_digest(self.fetcher.as_ref(), image).await?;

        // re-fetch fresh from storage; the record that existed when the
        // task was spawned may have changed since
        let mut algorithm = self
            .algorithms
            .get(algorithm_id)
            .await?
            .ok_or_else(|| StoreError::AlgorithmNotFound(algorithm_id.clone()))?;
        algorithm.image = resolved.image;
        algorithm.digest = Some(resolved.digest.clone());
        self.algorithms.save(&algorithm).await?;

        Ok(resolved.digest)
    }
}
