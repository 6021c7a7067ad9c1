//! Registry builder

use std::sync::Arc;

use api_client::ApiClient;

use crate::catalog::Catalog;
use crate::composite::{MultiReadDocker, ReadWriteDocker};
use crate::docker::{Docker, Repo};
use crate::error::RegistryResult;
use crate::local::StorageDocker;
use crate::name::RepoName;
use crate::page::Limit;
use crate::proxy::ProxyDocker;

/// Registry builder for wiring local storage and upstream proxies
///
/// Writes always go to local storage. Reads try local storage and every
/// proxy, taking whichever answers first.
#[derive(Debug)]
pub struct RegistryBuilder {
    storage: storage::Storage,
    proxies: Vec<ApiClient>,
}

impl RegistryBuilder {
    /// Create a new registry builder over `storage`
    pub fn new(storage: storage::Storage) -> Self {
        Self {
            storage,
            proxies: Vec::new(),
        }
    }

    /// Add an upstream registry to read through
    pub fn proxy(mut self, client: ApiClient) -> Self {
        self.proxies.push(client);
        self
    }

    /// Build the registry
    pub fn build(self) -> Registry {
        let local: Arc<dyn Docker> = Arc::new(StorageDocker::new(self.storage));
        if self.proxies.is_empty() {
            return Registry { docker: local };
        }

        tracing::debug!(proxies = self.proxies.len(), "building read-through registry");
        let mut sources = vec![Arc::clone(&local)];
        sources.extend(
            self.proxies
                .into_iter()
                .map(|client| Arc::new(ProxyDocker::new(client)) as Arc<dyn Docker>),
        );

        let read: Arc<dyn Docker> = Arc::new(MultiReadDocker::new(sources));
        Registry {
            docker: Arc::new(ReadWriteDocker::new(read, local)),
        }
    }
}

/// A configured registry.
#[derive(Debug, Clone)]
pub struct Registry {
    docker: Arc<dyn Docker>,
}

#[async_trait::async_trait]
impl Docker for Registry {
    fn repo(&self, name: &RepoName) -> Repo {
        self.docker.repo(name)
    }

    async fn catalog(&self, from: Option<&RepoName>, limit: Limit) -> RegistryResult<Catalog> {
        self.docker.catalog(from, limit).await
    }
}
