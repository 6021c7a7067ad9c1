use std::sync::Arc;

use super::{MultiReadLayers, MultiReadManifests, ReadWriteLayers, ReadWriteManifests};
use crate::blob::Layers;
use crate::catalog::Catalog;
use crate::docker::{Docker, Repo};
use crate::error::RegistryResult;
use crate::manifest::Manifests;
use crate::name::RepoName;
use crate::page::Limit;

/// Read-only registry over several registries.
#[derive(Debug, Clone)]
pub struct MultiReadDocker {
    dockers: Vec<Arc<dyn Docker>>,
}

impl MultiReadDocker {
    /// Compose `dockers`, in lookup order.
    pub fn new(dockers: Vec<Arc<dyn Docker>>) -> Self {
        Self { dockers }
    }
}

#[async_trait::async_trait]
impl Docker for MultiReadDocker {
    fn repo(&self, name: &RepoName) -> Repo {
        let repos: Vec<Repo> = self.dockers.iter().map(|docker| docker.repo(name)).collect();
        let layers: Vec<Arc<dyn Layers>> = repos.iter().map(|repo| repo.layers().clone()).collect();
        let manifests: Vec<Arc<dyn Manifests>> =
            repos.iter().map(|repo| repo.manifests().clone()).collect();

        Repo::new(
            name.clone(),
            Arc::new(MultiReadLayers::new(layers)),
            Arc::new(MultiReadManifests::new(name.clone(), manifests)),
        )
    }

    /// The union of every catalog; a failing registry is logged and skipped.
    #[tracing::instrument(skip(self), fields(sources = self.dockers.len()))]
    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog> {
        let pages = futures::future::join_all(
            self.dockers
                .iter()
                .map(|docker| docker.catalog(from, limit)),
        )
        .await;

        let pages = pages
            .into_iter()
            .enumerate()
            .filter_map(|(index, page)| match page {
                Ok(page) => Some(page),
                Err(error) => {
                    tracing::warn!(source = index, %error, "catalog unavailable, skipping");
                    None
                }
            });
        Ok(Catalog::join(pages, from, limit))
    }
}

/// Registry reading from one registry and writing to another.
#[derive(Debug, Clone)]
pub struct ReadWriteDocker {
    read: Arc<dyn Docker>,
    write: Arc<dyn Docker>,
}

impl ReadWriteDocker {
    /// Read from `read`, write to `write`.
    pub fn new(read: Arc<dyn Docker>, write: Arc<dyn Docker>) -> Self {
        Self { read, write }
    }
}

#[async_trait::async_trait]
impl Docker for ReadWriteDocker {
    fn repo(&self, name: &RepoName) -> Repo {
        let read = self.read.repo(name);
        let write = self.write.repo(name);

        Repo::new(
            name.clone(),
            Arc::new(ReadWriteLayers::new(
                read.layers().clone(),
                write.layers().clone(),
            )),
            Arc::new(ReadWriteManifests::new(
                read.manifests().clone(),
                write.manifests().clone(),
            )),
        )
        .with_uploads(write.uploads().cloned())
    }

    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog> {
        self.read.catalog(from, limit).await
    }
}
