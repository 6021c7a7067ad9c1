use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use futures::{StreamExt as _, TryStreamExt as _};
use tokio::sync::RwLock;

use storage_driver::{ByteStream, Driver, Metadata, StorageError};

#[derive(Debug, Clone)]
struct MemoryItem {
    created: DateTime<Utc>,
    data: Bytes,
}

impl From<Bytes> for MemoryItem {
    fn from(data: Bytes) -> Self {
        Self {
            created: Utc::now(),
            data,
        }
    }
}

impl From<&MemoryItem> for Metadata {
    fn from(value: &MemoryItem) -> Self {
        Self {
            created: value.created,
            size: value.data.len() as u64,
        }
    }
}

/// Storage driver that keeps every object in memory.
///
/// Objects are ordered by key, so listings come back sorted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<Utf8PathBuf, MemoryItem>>,
}

impl MemoryStorage {
    /// Create a new, empty `MemoryStorage`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the storage holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl Driver for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, key: &Utf8Path, content: ByteStream) -> Result<(), StorageError> {
        let buf = content
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await
            .map_err(|err| StorageError::io(self.name(), err))?;

        let mut items = self.items.write().await;
        items.insert(key.to_owned(), buf.freeze().into());
        Ok(())
    }

    async fn value(&self, key: &Utf8Path) -> Result<ByteStream, StorageError> {
        let items = self.items.read().await;
        let data = items
            .get(key)
            .ok_or_else(|| StorageError::not_found(self.name(), key.as_str()))?
            .data
            .clone();

        Ok(futures::stream::once(async move { Ok::<_, std::io::Error>(data) }).boxed())
    }

    async fn metadata(&self, key: &Utf8Path) -> Result<Metadata, StorageError> {
        let items = self.items.read().await;
        Ok(items
            .get(key)
            .ok_or_else(|| StorageError::not_found(self.name(), key.as_str()))?
            .into())
    }

    async fn list(&self, prefix: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StorageError> {
        tracing::trace!(%prefix, "list memory storage");

        let items = self.items.read().await;
        Ok(items
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &Utf8Path) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(data: &'static [u8]) -> ByteStream {
        futures::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from_static(data)) })
            .boxed()
    }

    async fn read(storage: &MemoryStorage, key: &str) -> Vec<u8> {
        let chunks: Vec<Bytes> = storage
            .value(Utf8Path::new(key))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn save_and_value() {
        let storage = MemoryStorage::new();
        storage
            .save(Utf8Path::new("a/b/data"), content(b"hello"))
            .await
            .unwrap();

        assert_eq!(read(&storage, "a/b/data").await, b"hello");
        assert_eq!(
            storage
                .metadata(Utf8Path::new("a/b/data"))
                .await
                .unwrap()
                .size,
            5
        );
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let storage = MemoryStorage::new();
        let Err(err) = storage.value(Utf8Path::new("missing")).await else {
            panic!("missing key should not produce a value");
        };
        assert!(err.is_not_found());
        assert!(!storage.exists(Utf8Path::new("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn list_matches_whole_components() {
        let storage = MemoryStorage::new();
        for key in ["repos/a/x", "repos/a/y", "repos/ab/z", "other/a"] {
            storage.save(Utf8Path::new(key), content(b"")).await.unwrap();
        }

        let keys = storage.list(Utf8Path::new("repos/a")).await.unwrap();
        assert_eq!(
            keys,
            vec![Utf8PathBuf::from("repos/a/x"), Utf8PathBuf::from("repos/a/y")]
        );
        assert!(storage.list(Utf8Path::new("nothing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let storage = MemoryStorage::new();
        storage.save(Utf8Path::new("k"), content(b"v")).await.unwrap();
        storage.save(Utf8Path::new("k"), content(b"w")).await.unwrap();
        assert_eq!(storage.len().await, 1);

        storage.delete(Utf8Path::new("k")).await.unwrap();
        assert!(storage.is_empty().await);
    }
}
