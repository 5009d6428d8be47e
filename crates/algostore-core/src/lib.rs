//! Algostore Core Library
//!
//! Lifecycle logic for the federated algorithm store: "what is approved is
//! what executes". Registration binds an entry to an immutable content
//! digest through the detached assignment worker; reviewer consensus is
//! enforced by the review service and its central state machine.
//!
//! - `AlgorithmService`: registration and digest refresh
//! - `DigestAssignmentWorker`: off-path digest resolution
//! - `ReviewService`: review create/approve/reject/delete with algorithm
//!   status recomputation
//! - `lifecycle`: the pure transition rules

pub mod algorithm;
pub mod auth;
pub mod config;
pub mod digest_worker;
pub mod error;
pub mod lifecycle;
pub mod review;

pub use algorithm::AlgorithmService;
pub use auth::Principal;
pub use config::StoreConfig;
pub use digest_worker::DigestAssignmentWorker;
pub use error::{Result, StoreError};
pub use review::ReviewService;

pub use algostore_registry::{
    ManifestFetcher, RegistryClient, RegistryConfig, RegistryError, ResolvedImage,
};
pub use algostore_state::{
    AlgorithmId, AlgorithmRecord, AlgorithmStatus, AlgorithmStore, ImageDigest, PrincipalId,
    ReviewFilter, ReviewId, ReviewRecord, ReviewStatus, ReviewStore, StorageError,
};

/// Algostore core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
