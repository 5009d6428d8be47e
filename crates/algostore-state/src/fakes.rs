//! In-memory fakes for store traits (testing only)
//!
//! Provides `MemoryAlgorithmStore` and `MemoryReviewStore` that satisfy the
//! trait contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::schema::{AlgorithmId, AlgorithmRecord, ReviewId, ReviewRecord};
use crate::store_traits::*;

// ---------------------------------------------------------------------------
// MemoryAlgorithmStore
// ---------------------------------------------------------------------------

/// In-memory algorithm store backed by a `HashMap<id, record>`.
#[derive(Debug, Default)]
pub struct MemoryAlgorithmStore {
    records: Mutex<HashMap<String, AlgorithmRecord>>,
}

impl MemoryAlgorithmStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlgorithmStore for MemoryAlgorithmStore {
    async fn get(&self, id: &AlgorithmId) -> StorageResult<Option<AlgorithmRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, record: &AlgorithmRecord) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.id.0.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &AlgorithmId) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(&id.0);
        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<AlgorithmRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryReviewStore
// ---------------------------------------------------------------------------

/// In-memory review store backed by a `HashMap<id, record>`.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    records: Mutex<HashMap<String, ReviewRecord>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn get(&self, id: &ReviewId) -> StorageResult<Option<ReviewRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, record: &ReviewRecord) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.id.0.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &ReviewId) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(&id.0);
        Ok(())
    }

    async fn list(&self, filter: &ReviewFilter) -> StorageResult<Vec<ReviewRecord>> {
        let records = self.records.lock().unwrap();
        let mut matches: Vec<ReviewRecord> = records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches)
    }
}
