//! Image digest resolution
//!
//! Turns a mutable image reference (`registry/repo:tag`) into an immutable
//! content digest. References whose tag is itself a 64-char hex digest are
//! short-circuited without any network call; everything else goes through
//! the manifest protocol. Once a digest is stored it is never re-derived.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use algostore_state::{is_hex_digest, ImageDigest};

use crate::client::ManifestFetcher;
use crate::error::{RegistryError, RegistryResult};

/// An image reference split into its addressing components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    /// Registry host, e.g. `ghcr.io`. Defaults to `docker.io`.
    pub registry: String,
    /// Repository path, e.g. `demo/average`
    pub repository: String,
    /// Tag, `latest` if not specified
    pub tag: String,
}

/// A resolved image: tag-stripped reference plus content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Image reference without the tag component
    pub image: String,
    /// Content digest, either registry-reported or computed from the manifest
    pub digest: ImageDigest,
}

/// Split the tag component off an image reference.
///
/// The tag separator is the last `:` after the last `/`, so registry ports
/// (`localhost:5000/repo`) are not mistaken for tags. The tag defaults to
/// `latest` when absent.
pub fn split_tag_from_image(image: &str) -> RegistryResult<(String, String)> {
    let invalid = || RegistryError::InvalidReference {
        reference: image.to_string(),
    };

    let (repository, tag) = match image.rfind(':') {
        Some(idx) if image.rfind('/').map_or(true, |slash| idx > slash) => {
            (&image[..idx], image[idx + 1..].to_string())
        }
        _ => (image, "latest".to_string()),
    };
    if repository.is_empty() || tag.is_empty() || repository.contains(char::is_whitespace) {
        return Err(invalid());
    }
    Ok((repository.to_string(), tag))
}

/// Parse an image reference into registry, repository and tag.
///
/// A leading path component is only treated as a registry host when it
/// looks like one (contains `.` or `:`, or is `localhost`); bare Docker Hub
/// names get the implicit `library/` namespace.
pub fn parse_image_name(image: &str) -> RegistryResult<ImageName> {
    let (remainder, tag) = split_tag_from_image(image)?;

    let (registry, repository) = match remainder.split_once('/') {
        Some((host, rest))
            if host.contains('.') || host.contains(':') || host == "localhost" =>
        {
            (host.to_string(), rest.to_string())
        }
        Some(_) => ("docker.io".to_string(), remainder.clone()),
        None => ("docker.io".to_string(), format!("library/{remainder}")),
    };
    if repository.is_empty() || repository.ends_with('/') {
        return Err(RegistryError::InvalidReference {
            reference: image.to_string(),
        });
    }

    Ok(ImageName {
        registry,
        repository,
        tag,
    })
}

/// Compute the SHA-256 digest of a manifest body.
///
/// The manifest is serialized as canonical JSON before hashing: document
/// field order with three-space indentation, the exact form registries hash
/// to produce `Docker-Content-Digest`.
///
/// Strings are written as raw UTF-8, not `\uXXXX` escapes. Manifest bodies
/// are ASCII in practice, so the two forms hash identically there; a
/// non-ASCII string value would hash differently from an ASCII-escaping
/// serializer.
pub fn manifest_digest(manifest: &serde_json::Value) -> RegistryResult<ImageDigest> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"   ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    manifest.serialize(&mut serializer)?;
    Ok(ImageDigest::from_bytes(&buf))
}

/// Resolve the content digest of an image reference.
///
/// A 64-char hex tag is an already-pinned digest and is returned as
/// `sha256:<tag>` without touching the network. Otherwise the manifest is
/// fetched; a `Docker-Content-Digest` header is used verbatim, and only in
/// its absence is the digest computed from the manifest body.
pub async fn resolve_digest(
    fetcher: &dyn ManifestFetcher,
    full_image: &str,
) -> RegistryResult<ResolvedImage> {
    let (image_wo_tag, tag) = split_tag_from_image(full_image)?;

    if is_hex_digest(&tag) {
        debug!("Tag of {} is already a digest, skipping registry", full_image);
        let digest = ImageDigest::from_hex(&tag).map_err(|_| RegistryError::InvalidReference {
            reference: full_image.to_string(),
        })?;
        return Ok(ResolvedImage {
            image: image_wo_tag,
            digest,
        });
    }

    let name = parse_image_name(full_image)?;
    let response = fetcher
        .fetch_manifest(&name.registry, &name.repository, &name.tag)
        .await?;

    let digest = match response.digest_header {
        Some(header) => {
            ImageDigest::try_from(header.clone()).map_err(|_| RegistryError::Protocol {
                url: format!("https://{}/v2/{}/manifests/{}", name.registry, name.repository, name.tag),
                reason: format!("malformed content digest header: {header}"),
            })?
        }
        None => manifest_digest(&response.manifest)?,
    };

    Ok(ResolvedImage {
        image: image_wo_tag,
        digest,
    })
}
