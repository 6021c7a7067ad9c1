//! # Storage backends
//!
//! A cheaply clonable [`Storage`] handle over any [`Driver`], plus the
//! in-memory and local-filesystem drivers and their configuration.

use std::sync::Arc;

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use futures::{StreamExt as _, TryStreamExt as _};
use serde::Deserialize;

#[cfg(feature = "local")]
pub(crate) mod local;

pub(crate) mod memory;

#[cfg(feature = "local")]
#[doc(inline)]
pub use local::LocalDriver;

#[doc(inline)]
pub use memory::MemoryStorage;

#[doc(inline)]
pub use storage_driver::{ByteStream, Driver, Metadata, StorageError, StorageErrorKind};

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "driver")]
pub enum StorageConfig {
    /// Keep everything in memory; contents are lost on restart.
    Memory,

    /// Store objects as files under `path`.
    #[cfg(feature = "local")]
    Local {
        /// Root directory.
        path: Utf8PathBuf,
    },
}

impl StorageConfig {
    /// Build the configured storage backend.
    #[tracing::instrument]
    pub async fn build(self) -> Result<Storage, StorageError> {
        let client: Storage = match self {
            StorageConfig::Memory => MemoryStorage::new().into(),
            #[cfg(feature = "local")]
            StorageConfig::Local { path } => {
                tokio::fs::create_dir_all(&path)
                    .await
                    .map_err(|err| StorageError::io("local", err))?;
                LocalDriver::new(path).into()
            }
        };
        Ok(client)
    }
}

pub(crate) type ArcDriver = Arc<dyn Driver + Send + Sync>;

/// Handle to a storage driver.
///
/// Every method is traced with the driver name; the handle itself holds no
/// state besides the shared driver.
#[derive(Debug, Clone)]
pub struct Storage {
    driver: ArcDriver,
}

impl<D> From<D> for Storage
where
    D: Driver + Send + Sync + 'static,
{
    fn from(value: D) -> Self {
        Storage::new(value)
    }
}

impl Storage {
    /// Wrap a driver.
    pub fn new<D: Driver + Send + Sync + 'static>(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    /// The driver name.
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Save a stream of bytes at `key`.
    #[tracing::instrument(skip(self, content), fields(driver=self.driver.name()))]
    pub async fn save(&self, key: &Utf8Path, content: ByteStream) -> Result<(), StorageError> {
        tracing::trace!(%key, "Saving {key}");
        self.driver.save(key, content).await
    }

    /// Save an in-memory buffer at `key`.
    pub async fn save_bytes(
        &self,
        key: &Utf8Path,
        data: impl Into<Bytes>,
    ) -> Result<(), StorageError> {
        let data = data.into();
        self.save(
            key,
            futures::stream::once(async move { Ok::<_, std::io::Error>(data) }).boxed(),
        )
        .await
    }

    /// Open the value at `key` as a stream.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn value(&self, key: &Utf8Path) -> Result<ByteStream, StorageError> {
        tracing::trace!(%key, "Reading {key}");
        self.driver.value(key).await
    }

    /// Read the whole value at `key` into memory.
    pub async fn value_bytes(&self, key: &Utf8Path) -> Result<Bytes, StorageError> {
        let chunks: Vec<Bytes> = self
            .value(key)
            .await?
            .try_collect()
            .await
            .map_err(|err| StorageError::io(self.driver.name(), err))?;
        Ok(chunks.concat().into())
    }

    /// Size of the value at `key`, in bytes.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn size(&self, key: &Utf8Path) -> Result<u64, StorageError> {
        Ok(self.driver.metadata(key).await?.size)
    }

    /// Metadata of the value at `key`.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn metadata(&self, key: &Utf8Path) -> Result<Metadata, StorageError> {
        self.driver.metadata(key).await
    }

    /// Whether `key` exists.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn exists(&self, key: &Utf8Path) -> Result<bool, StorageError> {
        self.driver.exists(key).await
    }

    /// List every key under `prefix`.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn list(&self, prefix: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StorageError> {
        self.driver.list(prefix).await
    }

    /// Delete `key`.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn delete(&self, key: &Utf8Path) -> Result<(), StorageError> {
        self.driver.delete(key).await
    }
}
