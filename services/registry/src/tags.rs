//! Tag list pages.

use crate::name::{RepoName, Tag};

/// One page of the tags of a repository.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tags {
    name: RepoName,
    tags: Vec<Tag>,
}

impl Tags {
    /// A page of `tags` for repository `name`.
    pub fn new(name: RepoName, tags: Vec<Tag>) -> Self {
        Self { name, tags }
    }

    /// Repository name.
    pub fn name(&self) -> &RepoName {
        &self.name
    }

    /// Tags on this page, ascending.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Take the tags out of the page.
    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }

    /// The page as `{"name": ..., "tags": [...]}`.
    pub fn json(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name, "tags": self.tags })
    }
}
