//! Repository catalog pages.

use camino::{Utf8Path, Utf8PathBuf};

use crate::name::RepoName;
use crate::page::{self, Limit};

/// One page of the repositories hosted by a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    repositories: Vec<RepoName>,
}

impl Catalog {
    /// A page holding exactly `repositories`.
    pub fn new(repositories: Vec<RepoName>) -> Self {
        Self { repositories }
    }

    /// Build a page from a flat listing of storage keys under `root`.
    ///
    /// Each distinct first path segment below `root` is a repository.
    pub fn from_keys(
        root: &Utf8Path,
        keys: &[Utf8PathBuf],
        from: Option<&RepoName>,
        limit: Limit,
    ) -> Self {
        let names = page::children(root, keys).map(RepoName::from);
        Self::new(page::paginate(names, from, limit))
    }

    /// Merge several pages, then paginate the union again.
    pub fn join(
        catalogs: impl IntoIterator<Item = Catalog>,
        from: Option<&RepoName>,
        limit: Limit,
    ) -> Self {
        let names = catalogs.into_iter().flat_map(|catalog| catalog.repositories);
        Self::new(page::paginate(names, from, limit))
    }

    /// Repositories on this page, ascending.
    pub fn repositories(&self) -> &[RepoName] {
        &self.repositories
    }

    /// The page as `{"repositories": [...]}`.
    pub fn json(&self) -> serde_json::Value {
        serde_json::json!({ "repositories": self.repositories })
    }
}
