use std::sync::Arc;

use super::{JoinedTagsSource, first_present};
use crate::content::Content;
use crate::error::{RegistryError, RegistryResult};
use crate::manifest::{Manifest, Manifests};
use crate::name::{ManifestRef, RepoName, Tag};
use crate::page::Limit;
use crate::tags::Tags;

/// Read-only manifest store over several sources.
///
/// Lookups return the first manifest found; tags are the union of all
/// sources.
#[derive(Debug, Clone)]
pub struct MultiReadManifests {
    repo: RepoName,
    sources: Vec<Arc<dyn Manifests>>,
}

impl MultiReadManifests {
    /// Compose the stores of `repo` in `sources`.
    pub fn new(repo: RepoName, sources: Vec<Arc<dyn Manifests>>) -> Self {
        Self { repo, sources }
    }
}

#[async_trait::async_trait]
impl Manifests for MultiReadManifests {
    async fn put(&self, _reference: &ManifestRef, _content: Content) -> RegistryResult<Manifest> {
        Err(RegistryError::Unsupported("put on read-only manifests"))
    }

    #[tracing::instrument(skip(self), fields(repo = %self.repo, sources = self.sources.len()))]
    async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
        let found = first_present(&self.sources, |source| {
            let reference = reference.clone();
            async move { source.get(&reference).await }
        })
        .await;
        Ok(found)
    }

    async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags> {
        let joined =
            JoinedTagsSource::new(self.repo.clone(), self.sources.clone(), from.cloned(), limit);
        Ok(joined.tags().await)
    }
}

/// Manifest store reading from one backend and writing to another.
///
/// Calls are forwarded unchanged; nothing is cached.
#[derive(Debug, Clone)]
pub struct ReadWriteManifests {
    read: Arc<dyn Manifests>,
    write: Arc<dyn Manifests>,
}

impl ReadWriteManifests {
    /// Read from `read`, write to `write`.
    pub fn new(read: Arc<dyn Manifests>, write: Arc<dyn Manifests>) -> Self {
        Self { read, write }
    }
}

#[async_trait::async_trait]
impl Manifests for ReadWriteManifests {
    async fn put(&self, reference: &ManifestRef, content: Content) -> RegistryResult<Manifest> {
        self.write.put(reference, content).await
    }

    async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
        self.read.get(reference).await
    }

    async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags> {
        self.read.tags(from, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::fake::FakeManifests;

    fn split() -> (Arc<FakeManifests>, Arc<FakeManifests>, ReadWriteManifests) {
        let read = Arc::new(FakeManifests::named("read"));
        let write = Arc::new(FakeManifests::named("write"));
        let manifests = ReadWriteManifests::new(read.clone(), write.clone());
        (read, write, manifests)
    }

    #[tokio::test]
    async fn get_reads() {
        let (read, write, manifests) = split();
        let found = manifests
            .get(&"1.0".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&found.content()[..], b"read");
        assert_eq!(read.calls(), ["get 1.0"]);
        assert!(write.calls().is_empty());
    }

    #[tokio::test]
    async fn tags_read() {
        let (read, write, manifests) = split();
        manifests
            .tags(Some(&Tag::new("latest")), Limit::At(123))
            .await
            .unwrap();
        assert_eq!(read.calls(), [r#"tags Some(Tag("latest")) At(123)"#]);
        assert!(write.calls().is_empty());
    }

    #[tokio::test]
    async fn put_writes() {
        let (read, write, manifests) = split();
        manifests
            .put(&"sha256:123".parse().unwrap(), Content::from("data"))
            .await
            .unwrap();
        assert_eq!(write.calls(), ["put sha256:123"]);
        assert!(read.calls().is_empty());
    }

    #[tokio::test]
    async fn multi_read_takes_first_found() {
        let failing = Arc::new(FakeManifests::failing());
        let present = Arc::new(FakeManifests::named("present"));
        let manifests = MultiReadManifests::new(
            RepoName::new("r"),
            vec![failing.clone() as Arc<dyn Manifests>, present.clone()],
        );

        let found = manifests
            .get(&"latest".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&found.content()[..], b"present");
        assert_eq!(failing.calls(), ["get latest"]);

        let err = manifests
            .put(&"latest".parse().unwrap(), Content::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unsupported(_)));
    }

    #[tokio::test]
    async fn multi_read_joins_tags() {
        let manifests = MultiReadManifests::new(
            RepoName::new("r"),
            vec![
                Arc::new(FakeManifests::with_tags(&["b", "a"])) as Arc<dyn Manifests>,
                Arc::new(FakeManifests::with_tags(&["c", "a"])),
            ],
        );
        let tags = manifests.tags(None, Limit::Unbounded).await.unwrap();
        assert_eq!(tags.json().to_string(), r#"{"name":"r","tags":["a","b","c"]}"#);
    }
}
