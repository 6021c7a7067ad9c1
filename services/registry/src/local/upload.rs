//! Resumable blob uploads.

use std::io;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use storage::Storage;

use super::layout;
use crate::blob::{BlobRef, Layers};
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::name::RepoName;

/// An upload session, identified by repository and uuid.
///
/// The session keeps the uploaded bytes under `data` and the start time under
/// `startedat`, both below the session root.
#[derive(Debug, Clone)]
pub struct Upload {
    storage: Storage,
    repo: RepoName,
    uuid: String,
}

impl Upload {
    /// Refer to a session. Nothing is written until [`Upload::start`].
    pub fn new(storage: Storage, repo: RepoName, uuid: impl Into<String>) -> Self {
        Self {
            storage,
            repo,
            uuid: uuid.into(),
        }
    }

    /// Session id.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Repository the session uploads to.
    pub fn repo(&self) -> &RepoName {
        &self.repo
    }

    fn data(&self) -> camino::Utf8PathBuf {
        layout::upload(&self.repo, &self.uuid).join("data")
    }

    fn started(&self) -> camino::Utf8PathBuf {
        layout::upload(&self.repo, &self.uuid).join("startedat")
    }

    /// Create the empty session data and record the start time.
    #[tracing::instrument(skip(self), fields(repo = %self.repo, uuid = %self.uuid))]
    pub async fn start(&self) -> RegistryResult<()> {
        self.storage.save_bytes(&self.data(), Bytes::new()).await?;
        self.storage
            .save_bytes(&self.started(), Utc::now().to_rfc3339())
            .await?;
        tracing::debug!("upload started");
        Ok(())
    }

    /// When the session was started.
    pub async fn started_at(&self) -> RegistryResult<DateTime<Utc>> {
        let stamp = self.storage.value_bytes(&self.started()).await?;
        let stamp = String::from_utf8_lossy(&stamp);
        let started = DateTime::parse_from_rfc3339(stamp.trim())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(started.with_timezone(&Utc))
    }

    async fn size(&self) -> RegistryResult<u64> {
        Ok(self.storage.size(&self.data()).await?)
    }

    /// Write `chunk` as the whole upload.
    ///
    /// Only one chunk is accepted; use [`Upload::append_range`] for chunked
    /// uploads. Returns the offset of the last byte written.
    #[tracing::instrument(skip_all, fields(repo = %self.repo, uuid = %self.uuid))]
    pub async fn append(&self, chunk: Content) -> RegistryResult<u64> {
        if self.size().await? != 0 {
            return Err(RegistryError::Unsupported("multiple chunks not supported"));
        }

        self.storage.save(&self.data(), chunk.into_stream()).await?;
        self.offset().await
    }

    /// Append `chunk` at byte `start`, which must be the current upload size.
    ///
    /// Returns the offset of the last byte written.
    #[tracing::instrument(skip(self, chunk), fields(repo = %self.repo, uuid = %self.uuid))]
    pub async fn append_range(&self, start: u64, chunk: Content) -> RegistryResult<u64> {
        let size = self.size().await?;
        if start != size {
            return Err(RegistryError::RangeNotSatisfiable {
                expected: size,
                actual: start,
            });
        }

        // Read the existing bytes fully before the key is rewritten.
        let existing = self.storage.value_bytes(&self.data()).await?;
        let stream = futures::stream::once(async move { Ok::<_, io::Error>(existing) })
            .chain(chunk.into_stream())
            .boxed();
        self.storage.save(&self.data(), stream).await?;
        self.offset().await
    }

    /// Offset of the last byte written, `0` when nothing was.
    pub async fn offset(&self) -> RegistryResult<u64> {
        Ok(self.size().await?.saturating_sub(1))
    }

    /// Uploaded bytes.
    pub async fn content(&self) -> RegistryResult<Content> {
        let size = self.size().await?;
        let stream = self.storage.value(&self.data()).await?;
        Ok(Content::new(stream, Some(size)))
    }

    /// Remove every key of the session.
    ///
    /// Keys are removed concurrently; if some removals fail the session is
    /// left partially cleaned and the first failure is returned.
    #[tracing::instrument(skip(self), fields(repo = %self.repo, uuid = %self.uuid))]
    pub async fn delete(&self) -> RegistryResult<()> {
        let keys = self
            .storage
            .list(&layout::upload(&self.repo, &self.uuid))
            .await?;
        if keys.is_empty() {
            return Ok(());
        }

        let results =
            futures::future::join_all(keys.iter().map(|key| self.storage.delete(key))).await;
        results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    /// `Location` of the session.
    pub fn location(&self) -> String {
        format!("/v2/{}/blobs/uploads/{}", self.repo, self.uuid)
    }

    /// `Range` of the bytes received so far.
    pub async fn range(&self) -> RegistryResult<String> {
        Ok(format!("0-{}", self.offset().await?))
    }

    /// Store the uploaded bytes in `layers` as `digest` and end the session.
    ///
    /// When the digest does not match, the session is kept so the client can
    /// retry.
    #[tracing::instrument(skip(self, layers), fields(repo = %self.repo, uuid = %self.uuid))]
    pub async fn commit(&self, layers: &dyn Layers, digest: &Digest) -> RegistryResult<BlobRef> {
        let blob = layers.put(self.content().await?, digest).await?;
        self.delete().await?;
        Ok(blob)
    }
}

/// Upload sessions of one repository.
#[derive(Debug, Clone)]
pub struct Uploads {
    storage: Storage,
    repo: RepoName,
}

impl Uploads {
    /// Upload sessions for `repo`.
    pub fn new(storage: Storage, repo: RepoName) -> Self {
        Self { storage, repo }
    }

    /// Start a new session with a fresh uuid.
    pub async fn start(&self) -> RegistryResult<Upload> {
        let upload = Upload::new(
            self.storage.clone(),
            self.repo.clone(),
            uuid::Uuid::new_v4().to_string(),
        );
        upload.start().await?;
        Ok(upload)
    }

    /// Find a started session.
    pub async fn get(&self, uuid: &str) -> RegistryResult<Option<Upload>> {
        let upload = Upload::new(self.storage.clone(), self.repo.clone(), uuid);
        if self.storage.exists(&upload.started()).await? {
            Ok(Some(upload))
        } else {
            Ok(None)
        }
    }
}
