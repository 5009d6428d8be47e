//! Algostore-State: Entity Layer for the Algorithm Store
//!
//! This crate defines the persisted shape of the store: algorithm entries,
//! review records, their closed status enumerations and the store traits
//! the lifecycle services are written against.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: making illegal states unrepresentable. Statuses are closed enums,
//! digests are validated newtypes, and status mutation happens only through
//! the lifecycle controller in `algostore-core`.
//!
//! ## Key Components
//!
//! - `AlgorithmRecord` / `ReviewRecord`: entity schema
//! - `ImageDigest`: validated `sha256:<hex>` content identity
//! - `AlgorithmStore` / `ReviewStore`: backend-agnostic persistence traits

mod error;
pub mod fakes;
mod schema;
pub mod store_traits;

pub use error::StorageError;
pub use schema::{
    is_hex_digest, AlgorithmId, AlgorithmRecord, AlgorithmStatus, ImageDigest, PrincipalId,
    ReviewId, ReviewRecord, ReviewStatus,
};
pub use store_traits::{
    AlgorithmStore, ReviewFilter, ReviewStatusFilter, ReviewStore, StorageResult,
};

/// Result type for algostore-state operations
pub type Result<T> = std::result::Result<T, StorageError>;
