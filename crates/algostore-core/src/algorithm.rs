//! Algorithm registration service
//!
//! Creates entries in their unreviewed state and keeps their content
//! identity current. Digest resolution always happens through the detached
//! assignment worker, so an unreachable or slow registry never stalls the
//! caller; readers must treat a null digest as a valid transient state.

use std::sync::Arc;

use tracing::info;

use algostore_state::{AlgorithmId, AlgorithmRecord, AlgorithmStore};

use crate::auth::Principal;
use crate::digest_worker::DigestAssignmentWorker;
use crate::error::{Result, StoreError};

/// Service for registering and updating algorithm entries.
#[derive(Clone)]
pub struct AlgorithmService {
    algorithms: Arc<dyn AlgorithmStore>,
    worker: DigestAssignmentWorker,
}

impl AlgorithmService {
    pub fn new(algorithms: Arc<dyn AlgorithmStore>, worker: DigestAssignmentWorker) -> Self {
        AlgorithmService { algorithms, worker }
    }

    async fn get_algorithm(&self, id: &AlgorithmId) -> Result<AlgorithmRecord> {
        self.algorithms
            .get(id)
            .await?
            .ok_or_else(|| StoreError::AlgorithmNotFound(id.clone()))
    }

    /// Register a new algorithm entry.
    ///
    /// The entry is persisted awaiting reviewer assignment and returned
    /// immediately; digest resolution is detached onto the worker.
    pub async fn register(&self, image: &str, developer: &Principal) -> Result<AlgorithmRecord> {
        let record = AlgorithmRecord::new(image, developer.id.clone());
        self.algorithms.save(&record).await?;

        self.worker.spawn(record.id.clone(), record.image.clone());

        info!("Algorithm {} registered for image {}", record.id, image);
        Ok(record)
    }

    /// Update an entry's image reference and/or refresh its digest.
    ///
    /// The worker is re-invoked when the image reference changed or when a
    /// refresh is explicitly requested, even if a digest is already stored.
    pub async fn update_image(
        &self,
        id: &AlgorithmId,
        image: &str,
        refresh_digest: bool,
    ) -> Result<AlgorithmRecord> {
        let mut record = self.get_algorithm(id).await?;

        let image_changed = record.image != image;
        if image_changed {
            record.image = image.to_string();
            self.algorithms.save(&record).await?;
        }
        if image_changed || refresh_digest {
            self.worker.spawn(record.id.clone(), image.to_string());
        }

        Ok(record)
    }

    /// Re-resolve the digest for the stored image reference.
    pub async fn refresh_digest(&self, id: &AlgorithmId) -> Result<()> {
        let record = self.get_algorithm(id).await?;
        self.worker.spawn(record.id.clone(), record.image.clone());
        Ok(())
    }
}
