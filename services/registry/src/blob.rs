//! Blobs and the stores that hold them.

use std::fmt;
use std::sync::Arc;

use crate::content::Content;
use crate::digest::Digest;
use crate::error::RegistryResult;

/// An immutable binary object addressed by its digest.
#[async_trait::async_trait]
pub trait Blob: fmt::Debug + Send + Sync {
    /// Digest of the content.
    fn digest(&self) -> &Digest;

    /// Size of the content, in bytes.
    async fn size(&self) -> RegistryResult<u64>;

    /// Open the content for reading.
    async fn content(&self) -> RegistryResult<Content>;
}

/// Shared handle to a blob.
pub type BlobRef = Arc<dyn Blob>;

/// A content addressed blob store.
#[async_trait::async_trait]
pub trait Layers: fmt::Debug + Send + Sync {
    /// Store `content` as the blob `digest`.
    ///
    /// The store verifies that the content hashes to `digest` before
    /// acknowledging; on a mismatch nothing is kept.
    async fn put(&self, content: Content, digest: &Digest) -> RegistryResult<BlobRef>;

    /// Make an existing blob available in this store.
    async fn mount(&self, blob: BlobRef) -> RegistryResult<BlobRef>;

    /// Look up a blob. Absence is `Ok(None)`.
    async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Blob, Layers);
}
