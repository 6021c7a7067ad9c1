//! Paths on the upstream registry.

use std::fmt;

use crate::digest::Digest;
use crate::name::{ManifestRef, RepoName, Tag};
use crate::page::Limit;

/// `path` with the `n` and `last` pagination parameters.
fn paged(path: &str, last: Option<&str>, limit: Limit) -> String {
    let mut params = Vec::new();
    if let Some(n) = limit.value() {
        params.push(format!("n={n}"));
    }
    if let Some(last) = last {
        params.push(format!("last={last}"));
    }

    if params.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{}", params.join("&"))
    }
}

/// Path of one catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUri {
    from: Option<RepoName>,
    limit: Limit,
}

impl CatalogUri {
    /// The page after `from`, of at most `limit` entries.
    pub fn new(from: Option<RepoName>, limit: Limit) -> Self {
        Self { from, limit }
    }
}

impl fmt::Display for CatalogUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.from.as_ref().map(RepoName::as_str);
        f.write_str(&paged("/v2/_catalog", last, self.limit))
    }
}

pub(crate) fn tags(repo: &RepoName, from: Option<&Tag>, limit: Limit) -> String {
    paged(
        &format!("/v2/{repo}/tags/list"),
        from.map(Tag::as_str),
        limit,
    )
}

pub(crate) fn blob(repo: &RepoName, digest: &Digest) -> String {
    format!("/v2/{repo}/blobs/{digest}")
}

pub(crate) fn manifest(repo: &RepoName, reference: &ManifestRef) -> String {
    format!("/v2/{repo}/manifests/{reference}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parameters() {
        assert_eq!(
            CatalogUri::new(None, Limit::Unbounded).to_string(),
            "/v2/_catalog"
        );
        assert_eq!(
            CatalogUri::new(None, Limit::At(10)).to_string(),
            "/v2/_catalog?n=10"
        );
        assert_eq!(
            CatalogUri::new(Some("my-alpine".into()), Limit::Unbounded).to_string(),
            "/v2/_catalog?last=my-alpine"
        );
        assert_eq!(
            CatalogUri::new(Some("my-alpine".into()), Limit::At(10)).to_string(),
            "/v2/_catalog?n=10&last=my-alpine"
        );
    }

    #[test]
    fn repository_paths() {
        let repo = RepoName::new("library/alpine");
        assert_eq!(
            tags(&repo, Some(&Tag::new("3.18")), Limit::At(2)),
            "/v2/library/alpine/tags/list?n=2&last=3.18"
        );
        assert_eq!(
            blob(&repo, &Digest::sha256("ab")),
            "/v2/library/alpine/blobs/sha256:ab"
        );
        assert_eq!(
            manifest(&repo, &"latest".parse().unwrap()),
            "/v2/library/alpine/manifests/latest"
        );
    }
}
