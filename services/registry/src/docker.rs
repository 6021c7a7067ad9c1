//! Registries and their repositories.

use std::fmt;
use std::sync::Arc;

use crate::blob::Layers;
use crate::catalog::Catalog;
use crate::error::RegistryResult;
use crate::local::Uploads;
use crate::manifest::Manifests;
use crate::name::RepoName;
use crate::page::Limit;

/// A registry: a set of repositories plus their catalog.
#[async_trait::async_trait]
pub trait Docker: fmt::Debug + Send + Sync {
    /// Open a repository. Repositories are never absent, only empty.
    fn repo(&self, name: &RepoName) -> Repo;

    /// One page of repository names, ascending, strictly after `from`.
    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog>;
}

/// The stores of a single repository.
#[derive(Debug, Clone)]
pub struct Repo {
    name: RepoName,
    layers: Arc<dyn Layers>,
    manifests: Arc<dyn Manifests>,
    uploads: Option<Uploads>,
}

impl Repo {
    /// A read-only repository.
    pub fn new(name: RepoName, layers: Arc<dyn Layers>, manifests: Arc<dyn Manifests>) -> Self {
        Self {
            name,
            layers,
            manifests,
            uploads: None,
        }
    }

    /// Accept uploads.
    pub fn with_uploads(mut self, uploads: Option<Uploads>) -> Self {
        self.uploads = uploads;
        self
    }

    /// Repository name.
    pub fn name(&self) -> &RepoName {
        &self.name
    }

    /// Blob store.
    pub fn layers(&self) -> &Arc<dyn Layers> {
        &self.layers
    }

    /// Manifest and tag store.
    pub fn manifests(&self) -> &Arc<dyn Manifests> {
        &self.manifests
    }

    /// Upload sessions, when the repository is writable.
    pub fn uploads(&self) -> Option<&Uploads> {
        self.uploads.as_ref()
    }
}
