//! Stores composed from other stores.
//!
//! `MultiRead*` types fan a read out over several sources; `ReadWrite*`
//! types split reads and writes between two backends.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use tracing::Instrument as _;

use crate::error::RegistryResult;

mod docker;
mod layers;
mod manifests;
mod tags;

pub use self::docker::{MultiReadDocker, ReadWriteDocker};
pub use self::layers::{MultiReadLayers, ReadWriteLayers};
pub use self::manifests::{MultiReadManifests, ReadWriteManifests};
pub use self::tags::JoinedTagsSource;

/// Run `lookup` against every source concurrently and return the first
/// value found.
///
/// Failing sources are logged and skipped. Each lookup runs as its own task,
/// so lookups still running once a value is found, or once the caller stops
/// waiting, carry on to completion with their results dropped.
pub(crate) async fn first_present<S, T, F, Fut>(sources: &[Arc<S>], lookup: F) -> Option<T>
where
    S: ?Sized,
    T: Send + 'static,
    F: Fn(Arc<S>) -> Fut,
    Fut: Future<Output = RegistryResult<Option<T>>> + Send + 'static,
{
    let mut lookups: FuturesUnordered<_> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let lookup = lookup(Arc::clone(source));
            tokio::spawn(async move { (index, lookup.await) }.in_current_span())
        })
        .collect();

    while let Some(joined) = lookups.next().await {
        match joined {
            Ok((index, Ok(Some(found)))) => {
                tracing::debug!(source = index, "found");
                return Some(found);
            }
            Ok((_, Ok(None))) => {}
            Ok((index, Err(error))) => {
                tracing::warn!(source = index, %error, "source failed, skipping");
            }
            Err(error) => {
                tracing::warn!(%error, "lookup task failed, skipping");
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::RegistryError;

    #[tokio::test]
    async fn abandoned_lookups_run_to_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let sources = vec![Arc::clone(&finished)];

        let lookup = first_present(&sources, |finished| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            finished.store(true, Ordering::SeqCst);
            Ok::<_, RegistryError>(Some(()))
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(1), lookup)
                .await
                .is_err()
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn nothing_found_without_sources() {
        let sources: Vec<Arc<()>> = Vec::new();
        let found = first_present(&sources, |_| async { Ok::<_, RegistryError>(Some(1)) }).await;
        assert_eq!(found, None);
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Stores for exercising composites.

    use std::sync::Mutex;

    use bytes::Bytes;

    use crate::blob::{Blob, BlobRef, Layers};
    use crate::content::Content;
    use crate::digest::Digest;
    use crate::error::{RegistryError, RegistryResult};
    use crate::manifest::{Manifest, Manifests};
    use crate::name::{ManifestRef, RepoName, Tag};
    use crate::page::{self, Limit};
    use crate::tags::Tags;

    #[derive(Debug)]
    pub(crate) struct FakeBlob {
        pub(crate) digest: Digest,
        pub(crate) data: Bytes,
    }

    #[async_trait::async_trait]
    impl Blob for FakeBlob {
        fn digest(&self) -> &Digest {
            &self.digest
        }

        async fn size(&self) -> RegistryResult<u64> {
            Ok(self.data.len() as u64)
        }

        async fn content(&self) -> RegistryResult<Content> {
            Ok(Content::from(self.data.clone()))
        }
    }

    /// Layers answering from a fixed set, after an optional delay.
    #[derive(Debug, Default)]
    pub(crate) struct FakeLayers {
        pub(crate) blobs: Vec<(Digest, Bytes)>,
        pub(crate) delay: Option<std::time::Duration>,
        pub(crate) fail: bool,
    }

    impl FakeLayers {
        pub(crate) fn with(data: &'static [u8]) -> Self {
            Self {
                blobs: vec![(Digest::of(data), Bytes::from_static(data))],
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl Layers for FakeLayers {
        async fn put(&self, _content: Content, _digest: &Digest) -> RegistryResult<BlobRef> {
            Err(RegistryError::Unsupported("fake put"))
        }

        async fn mount(&self, _blob: BlobRef) -> RegistryResult<BlobRef> {
            Err(RegistryError::Unsupported("fake mount"))
        }

        async fn get(&self, digest: &Digest) -> RegistryResult<Option<BlobRef>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(std::io::Error::other("source is down").into());
            }
            Ok(self
                .blobs
                .iter()
                .find(|(candidate, _)| candidate == digest)
                .map(|(digest, data)| -> BlobRef {
                    std::sync::Arc::new(FakeBlob {
                        digest: digest.clone(),
                        data: data.clone(),
                    })
                }))
        }
    }

    /// Manifests recording every call made to them.
    #[derive(Debug, Default)]
    pub(crate) struct FakeManifests {
        pub(crate) name: String,
        pub(crate) tags: Vec<&'static str>,
        pub(crate) fail: bool,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeManifests {
        pub(crate) fn named(name: &str) -> Self {
            Self {
                name: name.to_owned(),
                ..Default::default()
            }
        }

        pub(crate) fn with_tags(tags: &[&'static str]) -> Self {
            Self {
                tags: tags.to_vec(),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
        }

        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait::async_trait]
    impl Manifests for FakeManifests {
        async fn put(&self, reference: &ManifestRef, content: Content) -> RegistryResult<Manifest> {
            self.record(format!("put {reference}"));
            Ok(Manifest::from_bytes(content.into_bytes().await?))
        }

        async fn get(&self, reference: &ManifestRef) -> RegistryResult<Option<Manifest>> {
            self.record(format!("get {reference}"));
            if self.fail {
                return Err(std::io::Error::other("source is down").into());
            }
            Ok(Some(Manifest::from_bytes(Bytes::from(self.name.clone()))))
        }

        async fn tags(&self, from: Option<&Tag>, limit: Limit) -> RegistryResult<Tags> {
            self.record(format!("tags {from:?} {limit:?}"));
            if self.fail {
                return Err(std::io::Error::other("source is down").into());
            }
            let tags = self.tags.iter().copied().map(Tag::from);
            Ok(Tags::new(
                RepoName::new("fake"),
                page::paginate(tags, from, limit),
            ))
        }
    }
}
