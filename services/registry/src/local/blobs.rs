//! Blobs kept in a [`Storage`].

use std::sync::Arc;

use storage::Storage;

use super::layout;
use crate::blob::{Blob, BlobRef, Layers};
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::name::RepoName;

/// A blob whose bytes live in storage.
#[derive(Debug, Clone)]
pub struct StorageBlob {
    storage: Storage,
    digest: Digest,
}

impl StorageBlob {
    pub(crate) fn new(storage: Storage, digest: Digest) -> Self {
        Self { storage, digest }
    }
}

#[async_trait::async_trait]
impl Blob for StorageBlob {
    fn digest(&self) -> &Digest {
        &self.digest
    }

    async fn size(&self) -> RegistryResult<u64> {
        Ok(self.storage.size(&layout::blob_data(&self.digest)).await?)
    }

    async fn content(&self) -> RegistryResult<Content> {
        let key = layout::blob_data(&self.digest);
        let size = self.storage.size(&key).await?;
        let stream = self.storage.value(&key).await?;
        Ok(Content::new(stream, Some(size)))
    }
}

/// Verify `content` against `digest`, then write it to the shared blob area.
///
/// The content is buffered so nothing reaches storage until the hash has
/// been checked.
pub(crate) async fn store_blob(
    storage: &Storage,
    content: Content,
    digest: &Digest,
) -> RegistryResult<()> {
    if digest.algorithm() != Digest::SHA256 {
        return Err(RegistryError::UnsupportedDigest(digest.algorithm().to_owned()));
    }

    let data = content.into_bytes().await?;
    let actual = Digest::of(&data);
    if actual != *digest {
        return Err(RegistryError::DigestMismatch {
            expected: digest.to_string(),
            actual: actual.to_string(),
        });
    }

    let key = layout::blob_data(digest);
    if storage.exists(&key).await? {
        tracing::trace!(%digest, "blob data already present");
    } else {
        storage.save_bytes(&key, data).await?;
    }
    Ok(())
}

/// The blob store of one repository.
///
/// Bytes are kept once per digest; the repository holds a link to them.
#[derive(Debug, Clone)]
pub struct StorageLayers {
    storage: Storage,
    repo: RepoName,
}

impl StorageLayers {
    /// Blob store for `repo`.
    pub fn new(storage: Storage, repo: RepoName) -> Self {
        Self { storage, repo }
    }

    async fn link(&self, digest: &Digest) -> RegistryResult<BlobRef> {
        self.storage
            .save_bytes(&layout::layer_link(&self.repo, digest), digest.to_string())
            .await?;
        Ok(Arc::new(StorageBlob::new(self.storage.clone(), digest.clone())))
    }
}

#[async_trait::async_trait]
impl Layers for StorageLayers {
    #[tracing::instrument(skip(self, content), fields(repo = %self.repo))]
    async fn put(&self, content: Content, digest: &Digest) -> RegistryResult<BlobRef> {
        store_blob(&self.storage, content, digest).await?;
        tracing::debug!("stored blob");
        self.link(digest).await
    }

    #[tracing::instrument(skip_all, fields(repo = %self.repo, digest = %blob.digest()))]
    async fn mount(&self, blob: BlobRef) -> RegistryResult<BlobRef> {
        let digest = blob.digest().clone();
        if !self.storage.exists(&layout::blob_data(&digest)).await? {
            tracing::debug!("copying blob content");
            store_blob(&self.storage, blob.content().await?, &digest).await?;
        }
        self.link(&digest).await
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>> {
        let linked = self
            .storage
            .exists(&layout::layer_link(&self.repo, digest))
            .await?;
        if !linked || !self.storage.exists(&layout::blob_data(digest)).await? {
            return Ok(None);
        }

        Ok(Some(Arc::new(StorageBlob::new(
            self.storage.clone(),
            digest.clone(),
        ))))
    }
}
