//! Algostore-Registry: Image Identity Resolution
//!
//! Turns mutable image references into immutable content digests by
//! speaking the OCI distribution manifest protocol:
//!
//! - `RegistryClient`: HTTPS manifest retrieval with anonymous-then-bearer
//!   authentication and bounded per-call timeouts
//! - `resolver`: reference parsing, the pinned-digest short-circuit and
//!   canonical-JSON manifest hashing
//!
//! The resolver is written against the `ManifestFetcher` trait; tests use
//! the recording fake from the `fakes` module instead of a live registry.

mod client;
mod error;
pub mod fakes;
pub mod resolver;

pub use client::{
    manifest_host, parse_bearer_challenge, BearerChallenge, ManifestFetcher, ManifestResponse,
    RegistryClient, RegistryConfig, MANIFEST_V2_TYPE,
};
pub use error::{RegistryError, RegistryResult};
pub use resolver::{
    manifest_digest, parse_image_name, resolve_digest, split_tag_from_image, ImageName,
    ResolvedImage,
};
