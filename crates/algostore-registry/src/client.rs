//! Registry manifest protocol client
//!
//! Fetches image manifests over the OCI distribution protocol, which is
//! supported by all major container registries. Requests are anonymous
//! first; a 401 with a bearer challenge triggers exactly one token request
//! and one authenticated retry. Every call is bounded by the configured
//! timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Accept header value requesting the v2 manifest schema.
pub const MANIFEST_V2_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Response header carrying the registry-computed content digest.
const DIGEST_HEADER: &str = "Docker-Content-Digest";

/// Registry client configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Per-request timeout. Both the anonymous probe and the authenticated
    /// retry are bounded by this individually.
    pub timeout: Duration,
    /// User-Agent header for registry requests
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            timeout: Duration::from_secs(60),
            user_agent: format!("algostore-registry/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RegistryConfig {
    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A fetched manifest together with the registry's digest header, if any.
#[derive(Debug, Clone)]
pub struct ManifestResponse {
    /// `Docker-Content-Digest` header value, used verbatim when present
    pub digest_header: Option<String>,
    /// Manifest body, hash input when no digest header is supplied
    pub manifest: serde_json::Value,
}

/// Manifest retrieval abstraction.
///
/// The digest resolver and the assignment worker are written against this
/// trait; `RegistryClient` is the production implementation and tests use
/// the recording fake from the `fakes` module.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch the manifest for `{registry}/{repository}:{tag}`.
    async fn fetch_manifest(
        &self,
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> RegistryResult<ManifestResponse>;
}

// ---------------------------------------------------------------------------
// Bearer challenge parsing
// ---------------------------------------------------------------------------

/// Parsed `WWW-Authenticate: Bearer ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

/// Parse a bearer challenge header into its parameters.
///
/// The parameter list is parsed order-independently as `key="value"` pairs;
/// the protocol does not guarantee any particular parameter order. Returns
/// `None` when the header is not a bearer challenge or has no realm.
pub fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let trimmed = header.trim_start();
    let scheme = trimmed.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let params = &trimmed[6..];

    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for param in split_challenge_params(params) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }

    Some(BearerChallenge {
        realm: realm?,
        service,
        scope,
    })
}

/// Split a challenge parameter list on commas outside quoted values.
fn split_challenge_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (idx, c) in params.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(params[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(params[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

// ---------------------------------------------------------------------------
// RegistryClient
// ---------------------------------------------------------------------------

/// Map the registry component of an image name to its manifest host.
/// Docker Hub serves manifests from `registry-1.docker.io`.
pub fn manifest_host(registry: &str) -> &str {
    if registry == "docker.io" {
        "registry-1.docker.io"
    } else {
        registry
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTPS manifest client for container registries.
pub struct RegistryClient {
    http: reqwest::Client,
}

impl RegistryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RegistryConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        RegistryClient { http }
    }

    /// Request a bearer token from the challenge's realm.
    async fn request_token(&self, challenge: &BearerChallenge) -> RegistryResult<String> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(service) = &challenge.service {
            query.push(("service", service));
        }
        if let Some(scope) = &challenge.scope {
            query.push(("scope", scope));
        }

        let response = self
            .http
            .get(&challenge.realm)
            .query(&query)
            .send()
            .await
            .map_err(|e| protocol_error(&challenge.realm, &e.to_string()))?;
        if !response.status().is_success() {
            return Err(protocol_error(
                &challenge.realm,
                &format!("token request returned {}", response.status()),
            ));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| protocol_error(&challenge.realm, &e.to_string()))?;
        Ok(body.token)
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

fn protocol_error(url: &str, reason: &str) -> RegistryError {
    RegistryError::Protocol {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ManifestFetcher for RegistryClient {
    async fn fetch_manifest(
        &self,
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> RegistryResult<ManifestResponse> {
        let url = format!(
            "https://{}/v2/{}/manifests/{}",
            manifest_host(registry),
            repository,
            tag
        );
        self.fetch_manifest_at(&url, registry, repository, tag).await
    }
}

impl RegistryClient {
    /// Drive the manifest protocol against a concrete URL: anonymous
    /// probe, then at most one authenticated retry on a bearer challenge.
    async fn fetch_manifest_at(
        &self,
        url: &str,
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> RegistryResult<ManifestResponse> {
        debug!("Requesting manifest from {}", url);

        // anonymous probe first, as that is the most common case
        let mut response = self
            .http
            .get(url)
            .header(ACCEPT, MANIFEST_V2_TYPE)
            .send()
            .await
            .map_err(|e| protocol_error(url, &e.to_string()))?;

        // single authenticated retry on a bearer challenge
        if response.status() == StatusCode::UNAUTHORIZED {
            let header = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| protocol_error(url, "401 without WWW-Authenticate challenge"))?
                .to_string();
            let challenge = parse_bearer_challenge(&header).ok_or_else(|| {
                protocol_error(url, &format!("unparseable bearer challenge: {header}"))
            })?;
            debug!("Requesting bearer token from {}", challenge.realm);
            let token = self.request_token(&challenge).await?;

            response = self
                .http
                .get(url)
                .header(ACCEPT, MANIFEST_V2_TYPE)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| protocol_error(url, &e.to_string()))?;
        }

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::ImageNotFound {
                registry: registry.to_string(),
                repository: repository.to_string(),
                tag: tag.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(protocol_error(
                &url,
                &format!("manifest request returned {}", response.status()),
            ));
        }

        let digest_header = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let manifest = response
            .json()
            .await
            .map_err(|e| protocol_error(url, &e.to_string()))?;

        Ok(ManifestResponse {
            digest_header,
            manifest,
        })
    }
}
