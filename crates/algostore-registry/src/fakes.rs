//! In-memory fake for the manifest fetcher (testing only)
//!
//! `FakeManifestFetcher` serves a canned outcome and records how many
//! fetches were made, so tests can assert the zero-network short-circuit
//! and the no-retry policy without a live registry.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::client::{ManifestFetcher, ManifestResponse};
use crate::error::{RegistryError, RegistryResult};

#[derive(Debug, Clone)]
enum FakeOutcome {
    Manifest {
        digest_header: Option<String>,
        manifest: serde_json::Value,
    },
    NotFound,
    Protocol,
}

/// Manifest fetcher returning a fixed outcome and counting calls.
#[derive(Debug)]
pub struct FakeManifestFetcher {
    outcome: FakeOutcome,
    calls: AtomicUsize,
}

impl FakeManifestFetcher {
    /// Serve the given manifest body with no digest header.
    pub fn manifest(manifest: serde_json::Value) -> Self {
        FakeManifestFetcher {
            outcome: FakeOutcome::Manifest {
                digest_header: None,
                manifest,
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// Attach a `Docker-Content-Digest` header to the served manifest.
    pub fn with_digest_header(mut self, digest: &str) -> Self {
        if let FakeOutcome::Manifest { digest_header, .. } = &mut self.outcome {
            *digest_header = Some(digest.to_string());
        }
        self
    }

    /// Fail every fetch with `ImageNotFound`.
    pub fn not_found() -> Self {
        FakeManifestFetcher {
            outcome: FakeOutcome::NotFound,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every fetch with a protocol error.
    pub fn protocol_error() -> Self {
        FakeManifestFetcher {
            outcome: FakeOutcome::Protocol,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestFetcher for FakeManifestFetcher {
    async fn fetch_manifest(
        &self,
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> RegistryResult<ManifestResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            FakeOutcome::Manifest {
                digest_header,
                manifest,
            } => Ok(ManifestResponse {
                digest_header: digest_header.clone(),
                manifest: manifest.clone(),
            }),
            FakeOutcome::NotFound => Err(RegistryError::ImageNotFound {
                registry: registry.to_string(),
                repository: repository.to_string(),
                tag: tag.to_string(),
            }),
            FakeOutcome::Protocol => Err(RegistryError::Protocol {
                url: format!("https://{registry}/v2/{repository}/manifests/{tag}"),
                reason: "fake protocol error".to_string(),
            }),
        }
    }
}
