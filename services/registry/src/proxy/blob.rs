//! Blobs on the upstream registry.

use std::io;
use std::sync::Arc;

use api_client::ApiClient;
use api_client::response::ResponseExt as _;
use futures::{StreamExt as _, TryStreamExt as _};
use http::StatusCode;

use super::uri;
use crate::blob::{Blob, BlobRef, Layers};
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::name::RepoName;

/// A blob known to exist upstream, fetched on demand.
#[derive(Debug, Clone)]
pub struct ProxyBlob {
    client: ApiClient,
    repo: RepoName,
    digest: Digest,
    size: u64,
}

impl ProxyBlob {
    /// Blob `digest` of `repo`, of `size` bytes.
    pub fn new(client: ApiClient, repo: RepoName, digest: Digest, size: u64) -> Self {
        Self {
            client,
            repo,
            digest,
            size,
        }
    }
}

#[async_trait::async_trait]
impl Blob for ProxyBlob {
    fn digest(&self) -> &Digest {
        &self.digest
    }

    async fn size(&self) -> RegistryResult<u64> {
        Ok(self.size)
    }

    /// Resolves once the response head arrives. The body is streamed; a
    /// transfer error shows up as an error item of the stream.
    #[tracing::instrument(skip(self), fields(repo = %self.repo, digest = %self.digest))]
    async fn content(&self) -> RegistryResult<Content> {
        let response = self
            .client
            .get(&uri::blob(&self.repo, &self.digest))
            .send()
            .await
            .map_err(api_client::Error::Request)?
            .expect_status(StatusCode::OK)
            .await?;

        let size = response.content_length();
        tracing::debug!(?size, "streaming blob from upstream");
        let stream = response.into_stream().map_err(io::Error::other).boxed();
        Ok(Content::new(stream, size))
    }
}

/// The blob store of one upstream repository. Read only.
#[derive(Debug, Clone)]
pub struct ProxyLayers {
    client: ApiClient,
    repo: RepoName,
}

impl ProxyLayers {
    /// Blobs of `repo` on the registry behind `client`.
    pub fn new(client: ApiClient, repo: RepoName) -> Self {
        Self { client, repo }
    }
}

#[async_trait::async_trait]
impl Layers for ProxyLayers {
    async fn put(&self, _content: Content, _digest: &Digest) -> RegistryResult<BlobRef> {
        Err(RegistryError::Unsupported("put on proxied layers"))
    }

    async fn mount(&self, _blob: BlobRef) -> RegistryResult<BlobRef> {
        Err(RegistryError::Unsupported("mount on proxied layers"))
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>> {
        let response = self
            .client
            .head(&uri::blob(&self.repo, digest))
            .send()
            .await
            .map_err(api_client::Error::Request)?;

        match response.status() {
            StatusCode::OK => {
                let size = response.content_length().ok_or_else(|| {
                    RegistryError::InvalidUpstreamResponse(format!(
                        "no Content-Length for blob {digest}"
                    ))
                })?;
                Ok(Some(Arc::new(ProxyBlob::new(
                    self.client.clone(),
                    self.repo.clone(),
                    digest.clone(),
                    size,
                ))))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(api_client::Error::Response(response.into_error().await).into()),
        }
    }
}
