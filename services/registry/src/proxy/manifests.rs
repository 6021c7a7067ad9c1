//! Manifests on the upstream registry.

use api_client::ApiClient;
use api_client::response::ResponseExt as _;
use http::StatusCode;

use super::uri;
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::manifest::{MANIFEST_MEDIA_TYPES, Manifest, Manifests};
use crate::name::{ManifestRef, RepoName, Tag};
use crate::page::{self, Limit};
use crate::tags::Tags;

const DOCKER_CONTENT_DIGEST: &str = "docker-content-digest";

/// Tag list as upstream registries send it; `tags` may be `null`.
#[derive(Debug, serde::Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

/// The manifest store of one upstream repository. Read only.
#[derive(Debug, Clone)]
pub struct ProxyManifests {
    client: ApiClient,
    repo: RepoName,
}

impl ProxyManifests {
    /// Manifests of `repo` on the registry behind `client`.
    pub fn new(client: ApiClient, repo: RepoName) -> Self {
        Self { client, repo }
    }
}

#[async_trait::async_trait]
impl Manifests for ProxyManifests {
    async fn put(&self, _reference: &ManifestRef, _content: Content) -> RegistryResult<Manifest> {
        Err(RegistryError::Unsupported("put on proxied manifests"))
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo, %reference))]
    async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
        let response = self
            .client
            .get(&uri::manifest(&self.repo, reference))
            .header(http::header::ACCEPT, MANIFEST_MEDIA_TYPES.join(", "))
            .send()
            .await
            .map_err(api_client::Error::Request)?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            _ => return Err(api_client::Error::Response(response.into_error().await).into()),
        }

        let declared = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .map(|value| {
                value
                    .to_str()
                    .map_err(|err| RegistryError::InvalidUpstreamResponse(err.to_string()))
                    .and_then(str::parse::<Digest>)
            })
            .transpose()?;

        let content = response.bytes().await?;
        let manifest = match declared {
            Some(digest) => Manifest::new(digest, content),
            None => Manifest::from_bytes(content),
        };
        tracing::debug!(digest = %manifest.digest(), "fetched manifest from upstream");
        Ok(Some(manifest))
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo))]
    async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags> {
        let response = self
            .client
            .get(&uri::tags(&self.repo, from, limit))
            .send()
            .await
            .map_err(api_client::Error::Request)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Tags::new(self.repo.clone(), Vec::new()));
        }

        let list: TagList = response.expect_status(StatusCode::OK).await?.json().await?;
        let tags = list.tags.unwrap_or_default();
        Ok(Tags::new(self.repo.clone(), page::paginate(tags, from, limit)))
    }
}
