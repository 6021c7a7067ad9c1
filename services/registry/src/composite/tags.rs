use std::sync::Arc;

use crate::manifest::Manifests;
use crate::name::{RepoName, Tag};
use crate::page::{self, Limit};
use crate::tags::Tags;

/// The union of the tags of one repository across several sources.
#[derive(Debug, Clone)]
pub struct JoinedTagsSource {
    repo: RepoName,
    sources: Vec<Arc<dyn Manifests>>,
    from: Option<Tag>,
    limit: Limit,
}

impl JoinedTagsSource {
    /// Join the tags of `repo` in `sources`, for the page after `from`.
    pub fn new(
        repo: RepoName,
        sources: Vec<Arc<dyn Manifests>>,
        from: Option<Tag>,
        limit: Limit,
    ) -> Self {
        Self {
            repo,
            sources,
            from,
            limit,
        }
    }

    /// Query every source and merge the answers into one page.
    ///
    /// A failing source is logged and contributes no tags.
    #[tracing::instrument(skip(self), fields(repo = %self.repo, sources = self.sources.len()))]
    pub async fn tags(&self) -> Tags {
        let from = self.from.as_ref();
        let pages = futures::future::join_all(
            self.sources
                .iter()
                .map(|source| source.tags(from, self.limit)),
        )
        .await;

        let mut names = Vec::new();
        for (index, page) in pages.into_iter().enumerate() {
            match page {
                Ok(page) => names.extend(page.into_tags()),
                Err(error) => tracing::warn!(source = index, %error, "tags unavailable, skipping"),
            }
        }

        Tags::new(self.repo.clone(), page::paginate(names, from, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::fake::FakeManifests;

    fn joined(sources: Vec<FakeManifests>, from: Option<&str>, limit: Limit) -> JoinedTagsSource {
        JoinedTagsSource::new(
            RepoName::new("my-alpine"),
            sources
                .into_iter()
                .map(|source| Arc::new(source) as Arc<dyn Manifests>)
                .collect(),
            from.map(Tag::new),
            limit,
        )
    }

    #[tokio::test]
    async fn joins_and_pages() {
        let tags = joined(
            vec![
                FakeManifests::with_tags(&["one", "two"]),
                FakeManifests::with_tags(&["one", "three", "four"]),
            ],
            Some("four"),
            Limit::At(3),
        )
        .tags()
        .await;

        assert_eq!(
            tags.json().to_string(),
            r#"{"name":"my-alpine","tags":["one","three","two"]}"#
        );
    }

    #[tokio::test]
    async fn failing_source_contributes_nothing() {
        let tags = joined(
            vec![
                FakeManifests::failing(),
                FakeManifests::with_tags(&["b", "a"]),
            ],
            None,
            Limit::Unbounded,
        )
        .tags()
        .await;
        assert_eq!(tags.tags(), &[Tag::new("a"), Tag::new("b")]);

        let tags = joined(vec![FakeManifests::failing()], None, Limit::Unbounded)
            .tags()
            .await;
        assert!(tags.tags().is_empty());
    }

    #[tokio::test]
    async fn every_source_gets_the_same_query() {
        let one = Arc::new(FakeManifests::with_tags(&["a"]));
        let two = Arc::new(FakeManifests::with_tags(&["b"]));
        let source = JoinedTagsSource::new(
            RepoName::new("r"),
            vec![one.clone() as Arc<dyn Manifests>, two.clone()],
            Some(Tag::new("0")),
            Limit::At(7),
        );
        source.tags().await;

        let expected = vec![r#"tags Some(Tag("0")) At(7)"#.to_owned()];
        assert_eq!(one.calls(), expected);
        assert_eq!(two.calls(), expected);
    }
}
