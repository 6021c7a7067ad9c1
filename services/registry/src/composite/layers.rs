use std::sync::Arc;

use super::first_present;
use crate::blob::{BlobRef, Layers};
use crate::content::Content;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};

/// Read-only blob store resolving each lookup against several sources.
///
/// The first source to report the blob wins, regardless of source order.
#[derive(Debug, Clone)]
pub struct MultiReadLayers {
    sources: Vec<Arc<dyn Layers>>,
}

impl MultiReadLayers {
    /// Compose `sources`.
    pub fn new(sources: Vec<Arc<dyn Layers>>) -> Self {
        Self { sources }
    }
}

#[async_trait::async_trait]
impl Layers for MultiReadLayers {
    async fn put(&self, _content: Content, _digest: &Digest) -> RegistryResult<BlobRef> {
        Err(RegistryError::Unsupported("put on read-only layers"))
    }

    async fn mount(&self, _blob: BlobRef) -> RegistryResult<BlobRef> {
        Err(RegistryError::Unsupported("mount on read-only layers"))
    }

    #[tracing::instrument(skip(self), fields(sources = self.sources.len()))]
    async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>> {
        let found = first_present(&self.sources, |source| {
            let digest = digest.clone();
            async move { source.get(&digest).await }
        })
        .await;
        Ok(found)
    }
}

/// Blob store reading from one backend and writing to another.
#[derive(Debug, Clone)]
pub struct ReadWriteLayers {
    read: Arc<dyn Layers>,
    write: Arc<dyn Layers>,
}

impl ReadWriteLayers {
    /// Read from `read`, write to `write`.
    pub fn new(read: Arc<dyn Layers>, write: Arc<dyn Layers>) -> Self {
        Self { read, write }
    }
}

#[async_trait::async_trait]
impl Layers for ReadWriteLayers {
    async fn put(&self, content: Content, digest: &Digest) -> RegistryResult<BlobRef> {
        self.write.put(content, digest).await
    }

    async fn mount(&self, blob: BlobRef) -> RegistryResult<BlobRef> {
        self.write.mount(blob).await
    }

    async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>> {
        self.read.get(digest).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use storage::MemoryStorage;

    use super::*;
    use crate::composite::fake::FakeLayers;
    use crate::local::StorageLayers;

    fn multi(sources: Vec<FakeLayers>) -> MultiReadLayers {
        MultiReadLayers::new(
            sources
                .into_iter()
                .map(|source| Arc::new(source) as Arc<dyn Layers>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn finds_blob_in_any_source() {
        let digest = Digest::of(b"three");
        for position in 0..3 {
            let mut sources: Vec<FakeLayers> = vec![
                FakeLayers::with(b"one"),
                FakeLayers::with(b"two"),
                FakeLayers::default(),
            ];
            sources.insert(position, FakeLayers::with(b"three"));

            let blob = multi(sources).get(&digest).await.unwrap().unwrap();
            assert_eq!(blob.digest(), &digest);
            assert_eq!(blob.size().await.unwrap(), 5);
        }
    }

    #[tokio::test]
    async fn absent_everywhere() {
        let layers = multi(vec![FakeLayers::with(b"one"), FakeLayers::default()]);
        assert!(layers.get(&Digest::of(b"two")).await.unwrap().is_none());
        assert!(multi(vec![]).get(&Digest::of(b"two")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_sources_are_skipped() {
        let digest = Digest::of(b"one");
        let layers = multi(vec![FakeLayers::failing(), FakeLayers::with(b"one")]);
        assert!(layers.get(&digest).await.unwrap().is_some());

        let layers = multi(vec![FakeLayers::failing(), FakeLayers::failing()]);
        assert!(layers.get(&digest).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_answer_wins() {
        let slow = FakeLayers {
            delay: Some(Duration::from_secs(60)),
            ..FakeLayers::with(b"one")
        };
        let layers = multi(vec![slow, FakeLayers::with(b"one")]);

        let found = tokio::time::timeout(Duration::from_secs(5), layers.get(&Digest::of(b"one")))
            .await
            .expect("fast source should answer first");
        assert!(found.unwrap().is_some());
    }

    #[tokio::test]
    async fn writes_are_unsupported() {
        let layers = multi(vec![FakeLayers::with(b"one")]);
        let err = layers
            .put(Content::from("one"), &Digest::of(b"one"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unsupported(_)));

        let blob = layers.get(&Digest::of(b"one")).await.unwrap().unwrap();
        let err = layers.mount(blob).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unsupported(_)));
    }

    #[tokio::test]
    async fn read_write_split() {
        let write = Arc::new(StorageLayers::new(
            MemoryStorage::new().into(),
            "test".into(),
        ));
        let read = Arc::new(FakeLayers::with(b"remote"));
        let layers = ReadWriteLayers::new(read, write.clone());

        let digest = Digest::of(b"local");
        layers.put(Content::from("local"), &digest).await.unwrap();
        assert!(write.get(&digest).await.unwrap().is_some());
        assert!(layers.get(&digest).await.unwrap().is_none());
        assert!(layers.get(&Digest::of(b"remote")).await.unwrap().is_some());
    }
}
