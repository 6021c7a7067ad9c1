//! Manifests kept in a [`Storage`].

use storage::Storage;

use super::blobs::store_blob;
use super::layout;
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::manifest::{Manifest, Manifests};
use crate::name::{ManifestRef, RepoName, Tag};
use crate::page::{self, Limit};
use crate::tags::Tags;

/// The manifest and tag store of one repository.
///
/// Manifest bytes are stored as blobs. Revisions and tags are links holding
/// the manifest digest.
#[derive(Debug, Clone)]
pub struct StorageManifests {
    storage: Storage,
    repo: RepoName,
}

impl StorageManifests {
    /// Manifest store for `repo`.
    pub fn new(storage: Storage, repo: RepoName) -> Self {
        Self { storage, repo }
    }

    async fn read_link(&self, reference: &ManifestRef) -> RegistryResult<Option<Digest>> {
        let key = match reference {
            ManifestRef::Tag(tag) => layout::manifest_tag(&self.repo, tag),
            ManifestRef::Digest(digest) => layout::manifest_revision(&self.repo, digest),
        };

        if !self.storage.exists(&key).await? {
            return Ok(None);
        }

        let link = self.storage.value_bytes(&key).await?;
        String::from_utf8_lossy(&link).trim().parse().map(Some)
    }
}

#[async_trait::async_trait]
impl Manifests for StorageManifests {
    #[tracing::instrument(skip(self, content), fields(repo = %self.repo, %reference))]
    async fn put(&self, reference: &ManifestRef, content: Content) -> RegistryResult<Manifest> {
        let manifest = Manifest::from_bytes(content.into_bytes().await?);
        let digest = manifest.digest();

        if let ManifestRef::Digest(expected) = reference {
            if expected != digest {
                return Err(RegistryError::DigestMismatch {
                    expected: expected.to_string(),
                    actual: digest.to_string(),
                });
            }
        }

        store_blob(
            &self.storage,
            Content::from(manifest.content().clone()),
            digest,
        )
        .await?;

        self.storage
            .save_bytes(
                &layout::manifest_revision(&self.repo, digest),
                digest.to_string(),
            )
            .await?;

        if let ManifestRef::Tag(tag) = reference {
            self.storage
                .save_bytes(&layout::manifest_tag(&self.repo, tag), digest.to_string())
                .await?;
        }

        tracing::debug!(%digest, "stored manifest");
        Ok(manifest)
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo, %reference))]
    async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
        let Some(digest) = self.read_link(reference).await? else {
            return Ok(None);
        };

        let key = layout::blob_data(&digest);
        if !self.storage.exists(&key).await? {
            tracing::warn!(%digest, "manifest link points at missing data");
            return Ok(None);
        }

        let content = self.storage.value_bytes(&key).await?;
        Ok(Some(Manifest::new(digest, content)))
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags> {
        let root = layout::manifest_tags(&self.repo);
        let keys = self.storage.list(&root).await?;
        let tags = page::children(&root, &keys).map(Tag::from);
        Ok(Tags::new(self.repo.clone(), page::paginate(tags, from, limit)))
    }
}

#[cfg(test)]
mod tests {
    use storage::MemoryStorage;

    use super::*;

    const MANIFEST: &str = r#"{"schemaVersion":2,"layers":[]}"#;

    fn manifests() -> StorageManifests {
        StorageManifests::new(MemoryStorage::new().into(), RepoName::new("my-alpine"))
    }

    #[tokio::test]
    async fn round_trip_by_tag_and_digest() {
        let manifests = manifests();
        let tag: ManifestRef = "latest".parse().unwrap();

        let stored = manifests.put(&tag, Content::from(MANIFEST)).await.unwrap();
        assert_eq!(stored.digest(), &Digest::of(MANIFEST.as_bytes()));

        let by_tag = manifests.get(&tag).await.unwrap().unwrap();
        assert_eq!(by_tag, stored);

        let by_digest = manifests
            .get(&ManifestRef::Digest(stored.digest().clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&by_digest.content()[..], MANIFEST.as_bytes());
    }

    #[tokio::test]
    async fn absent_references() {
        let manifests = manifests();
        assert!(manifests.get(&"latest".parse().unwrap()).await.unwrap().is_none());
        assert!(
            manifests
                .get(&ManifestRef::Digest(Digest::of(b"nothing")))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn digest_reference_must_match() {
        let manifests = manifests();
        let wrong = ManifestRef::Digest(Digest::of(b"other"));
        let err = manifests.put(&wrong, Content::from(MANIFEST)).await.unwrap_err();
        assert!(matches!(err, RegistryError::DigestMismatch { .. }));

        let right = ManifestRef::Digest(Digest::of(MANIFEST.as_bytes()));
        manifests.put(&right, Content::from(MANIFEST)).await.unwrap();
        assert!(manifests.get(&right).await.unwrap().is_some());
        assert!(manifests.tags(None, Limit::Unbounded).await.unwrap().tags().is_empty());
    }

    #[tokio::test]
    async fn tags_are_paginated() {
        let manifests = manifests();
        for tag in ["3", "1", "latest", "2"] {
            manifests
                .put(&tag.parse().unwrap(), Content::from(MANIFEST))
                .await
                .unwrap();
        }

        let page = manifests
            .tags(Some(&Tag::new("1")), Limit::At(2))
            .await
            .unwrap();
        assert_eq!(page.json().to_string(), r#"{"name":"my-alpine","tags":["2","3"]}"#);

        let all = manifests.tags(None, Limit::Unbounded).await.unwrap();
        assert_eq!(all.tags().len(), 4);
    }
}
