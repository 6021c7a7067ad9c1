//! Read-through access to an upstream registry over HTTP.

use std::sync::Arc;

use api_client::ApiClient;
use http::StatusCode;

use crate::catalog::Catalog;
use crate::docker::{Docker, Repo};
use crate::error::RegistryResult;
use crate::name::RepoName;
use crate::page::{self, Limit};

mod blob;
mod manifests;
mod uri;

pub use self::blob::{ProxyBlob, ProxyLayers};
pub use self::manifests::ProxyManifests;
pub use self::uri::CatalogUri;

/// Catalog as upstream registries send it; `repositories` may be `null`.
#[derive(Debug, serde::Deserialize)]
struct CatalogPage {
    #[serde(default)]
    repositories: Option<Vec<RepoName>>,
}

/// An upstream registry. Its repositories are read only and take no uploads.
#[derive(Debug, Clone)]
pub struct ProxyDocker {
    client: ApiClient,
}

impl ProxyDocker {
    /// The registry behind `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Docker for ProxyDocker {
    fn repo(&self, name: &RepoName) -> Repo {
        Repo::new(
            name.clone(),
            Arc::new(ProxyLayers::new(self.client.clone(), name.clone())),
            Arc::new(ProxyManifests::new(self.client.clone(), name.clone())),
        )
    }

    #[tracing::instrument(skip(self), fields(upstream = %self.client.base()))]
    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog> {
        let uri = CatalogUri::new(from.cloned(), limit).to_string();
        let page: CatalogPage = self
            .client
            .get(&uri)
            .send()
            .await
            .map_err(api_client::Error::Request)?
            .expect_status(StatusCode::OK)
            .await?
            .json()
            .await?;

        let repositories = page.repositories.unwrap_or_default();
        Ok(Catalog::new(page::paginate(repositories, from, limit)))
    }
}
