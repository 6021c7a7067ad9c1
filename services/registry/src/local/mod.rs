//! A registry kept entirely in a [`Storage`].

use std::sync::Arc;

use camino::Utf8Path;
use storage::Storage;

use crate::catalog::Catalog;
use crate::docker::{Docker, Repo};
use crate::error::RegistryResult;
use crate::name::RepoName;
use crate::page::Limit;

mod blobs;
pub(crate) mod layout;
mod manifests;
mod upload;

pub use self::blobs::{StorageBlob, StorageLayers};
pub use self::manifests::StorageManifests;
pub use self::upload::{Upload, Uploads};

/// A registry whose repositories live in storage.
#[derive(Debug, Clone)]
pub struct StorageDocker {
    storage: Storage,
}

impl StorageDocker {
    /// A registry over `storage`.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The backing storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[async_trait::async_trait]
impl Docker for StorageDocker {
    fn repo(&self, name: &RepoName) -> Repo {
        Repo::new(
            name.clone(),
            Arc::new(StorageLayers::new(self.storage.clone(), name.clone())),
            Arc::new(StorageManifests::new(self.storage.clone(), name.clone())),
        )
        .with_uploads(Some(Uploads::new(self.storage.clone(), name.clone())))
    }

    #[tracing::instrument(skip(self))]
    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog> {
        let root = Utf8Path::new(layout::REPOSITORIES);
        let keys = self.storage.list(root).await?;
        tracing::trace!(keys = keys.len(), "listed repositories");
        Ok(Catalog::from_keys(root, &keys, from, limit))
    }
}
