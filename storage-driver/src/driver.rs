use std::{fmt, io, ops::Deref, sync::Arc};

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::StorageError;

/// A stream of bytes, used both to provide and to return object contents.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Object metadata, which will be generically provided by the driver.
///
/// This struct only provides common metadata fields, and drivers may provide more specific
/// metadata fields directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Metadata {
    /// The size of the object in bytes.
    pub size: u64,

    /// The creation timestamp of the object.
    pub created: DateTime<Utc>,
}

/// A key-value storage driver addressed by hierarchical keys.
///
/// Keys are UTF-8 paths such as `repositories/library/_uploads/<uuid>/data`.
/// Drivers do not interpret keys beyond treating `/` as the hierarchy separator
/// for [`Driver::list`].
#[async_trait::async_trait]
pub trait Driver: fmt::Debug {
    /// The name of the driver.
    fn name(&self) -> &'static str;

    /// Save an object, replacing any existing value at `key`.
    async fn save(&self, key: &Utf8Path, content: ByteStream) -> Result<(), StorageError>;

    /// Open an object for reading.
    async fn value(&self, key: &Utf8Path) -> Result<ByteStream, StorageError>;

    /// Get the metadata for an object.
    async fn metadata(&self, key: &Utf8Path) -> Result<Metadata, StorageError>;

    /// List every key under `prefix`, recursively.
    ///
    /// The prefix is matched by whole path components, so `a/b` does not
    /// match `a/bc/d`. An absent prefix yields an empty listing.
    async fn list(&self, prefix: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StorageError>;

    /// Delete an object.
    async fn delete(&self, key: &Utf8Path) -> Result<(), StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &Utf8Path) -> Result<bool, StorageError> {
        match self.metadata(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[async_trait::async_trait]
impl<D> Driver for Arc<D>
where
    D: ?Sized + Driver + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.deref().name()
    }

    async fn save(&self, key: &Utf8Path, content: ByteStream) -> Result<(), StorageError> {
        self.deref().save(key, content).await
    }

    async fn value(&self, key: &Utf8Path) -> Result<ByteStream, StorageError> {
        self.deref().value(key).await
    }

    async fn metadata(&self, key: &Utf8Path) -> Result<Metadata, StorageError> {
        self.deref().metadata(key).await
    }

    async fn list(&self, prefix: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StorageError> {
        self.deref().list(prefix).await
    }

    async fn delete(&self, key: &Utf8Path) -> Result<(), StorageError> {
        self.deref().delete(key).await
    }

    async fn exists(&self, key: &Utf8Path) -> Result<bool, StorageError> {
        self.deref().exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Driver);
}
