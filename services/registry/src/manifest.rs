//! Manifests and the stores that hold them.

use std::fmt;

use bytes::Bytes;

use crate::content::Content;
use crate::digest::Digest;
use crate::error::RegistryResult;
use crate::name::{ManifestRef, Tag};
use crate::page::Limit;
use crate::tags::Tags;

/// Docker image manifest, schema 1.
pub const DOCKER_MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Docker image manifest, schema 2.
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Docker manifest list.
pub const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
/// OCI image manifest.
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index.
pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Every manifest media type, in the order clients should prefer them.
pub const MANIFEST_MEDIA_TYPES: &[&str] = &[
    OCI_INDEX,
    OCI_MANIFEST,
    DOCKER_MANIFEST_LIST,
    DOCKER_MANIFEST_V2,
    DOCKER_MANIFEST_V1,
];

/// A stored manifest document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    digest: Digest,
    content: Bytes,
}

impl Manifest {
    /// A manifest with a known digest.
    pub fn new(digest: Digest, content: Bytes) -> Self {
        Self { digest, content }
    }

    /// A manifest addressed by the digest of `content`.
    pub fn from_bytes(content: Bytes) -> Self {
        Self::new(Digest::of(&content), content)
    }

    /// Manifest digest.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Raw manifest bytes.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Manifest size, in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Media type declared by, or inferred from, the document.
    pub fn media_type(&self) -> String {
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.content) else {
            return OCI_MANIFEST.to_owned();
        };

        if let Some(media_type) = json.get("mediaType").and_then(|v| v.as_str()) {
            return media_type.to_owned();
        }

        let media_type = match json.get("schemaVersion").and_then(|v| v.as_u64()) {
            Some(1) => DOCKER_MANIFEST_V1,
            Some(2) if json.get("manifests").is_some() => DOCKER_MANIFEST_LIST,
            Some(2) => DOCKER_MANIFEST_V2,
            _ => OCI_MANIFEST,
        };
        media_type.to_owned()
    }
}

/// A manifest and tag store for one repository.
#[async_trait::async_trait]
pub trait Manifests: fmt::Debug + Send + Sync {
    /// Store a manifest under `reference`.
    async fn put(&self, reference: &ManifestRef, content: Content) -> RegistryResult<Manifest>;

    /// Look up a manifest. Absence is `Ok(None)`.
    async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>>;

    /// One page of tags, ascending, strictly after `from`.
    async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags>;
}
