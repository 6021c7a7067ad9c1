//! Storage key layout.
//!
//! ```text
//! blobs/<alg>/<hex[0..2]>/<hex>/data
//! repositories/<repo>/_layers/<alg>/<hex>/link
//! repositories/<repo>/_manifests/revisions/<alg>/<hex>/link
//! repositories/<repo>/_manifests/tags/<tag>/current/link
//! repositories/<repo>/_uploads/<uuid>/{data,startedat}
//! ```

use camino::Utf8PathBuf;

use crate::digest::Digest;
use crate::name::{RepoName, Tag};

pub(crate) const REPOSITORIES: &str = "repositories";

fn repository(repo: &RepoName) -> Utf8PathBuf {
    Utf8PathBuf::from(REPOSITORIES).join(repo.as_str())
}

pub(crate) fn blob_data(digest: &Digest) -> Utf8PathBuf {
    let hex = digest.hex();
    let prefix = hex.get(..2).unwrap_or(hex);
    Utf8PathBuf::from("blobs")
        .join(digest.algorithm())
        .join(prefix)
        .join(hex)
        .join("data")
}

pub(crate) fn layer_link(repo: &RepoName, digest: &Digest) -> Utf8PathBuf {
    repository(repo)
        .join("_layers")
        .join(digest.algorithm())
        .join(digest.hex())
        .join("link")
}

pub(crate) fn manifest_revision(repo: &RepoName, digest: &Digest) -> Utf8PathBuf {
    repository(repo)
        .join("_manifests/revisions")
        .join(digest.algorithm())
        .join(digest.hex())
        .join("link")
}

pub(crate) fn manifest_tags(repo: &RepoName) -> Utf8PathBuf {
    repository(repo).join("_manifests/tags")
}

pub(crate) fn manifest_tag(repo: &RepoName, tag: &Tag) -> Utf8PathBuf {
    manifest_tags(repo).join(tag.as_str()).join("current/link")
}

pub(crate) fn upload(repo: &RepoName, uuid: &str) -> Utf8PathBuf {
    repository(repo).join("_uploads").join(uuid)
}
