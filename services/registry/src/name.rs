//! Repository names, tags and manifest references.
//!
//! Names arrive here already validated against the distribution grammar, so
//! these are plain string wrappers with an ordering.

use std::fmt;
use std::str::FromStr;

use crate::digest::Digest;
use crate::error::RegistryError;

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a `", stringify!($name), "`.")]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The name as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

name_type!(
    /// A repository name such as `library/alpine`.
    RepoName
);

name_type!(
    /// A tag such as `latest`.
    Tag
);

/// Addresses a manifest, either by tag or by digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManifestRef {
    /// A mutable tag.
    Tag(Tag),

    /// An immutable content digest.
    Digest(Digest),
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestRef::Tag(tag) => tag.fmt(f),
            ManifestRef::Digest(digest) => digest.fmt(f),
        }
    }
}

impl FromStr for ManifestRef {
    type Err = RegistryError;

    /// Tags can never contain `:`, so anything that does is a digest.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            s.parse().map(ManifestRef::Digest)
        } else {
            Ok(ManifestRef::Tag(Tag::new(s)))
        }
    }
}

impl From<Tag> for ManifestRef {
    fn from(value: Tag) -> Self {
        ManifestRef::Tag(value)
    }
}

impl From<Digest> for ManifestRef {
    fn from(value: Digest) -> Self {
        ManifestRef::Digest(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_ref_from_str() {
        assert_eq!(
            "latest".parse::<ManifestRef>().unwrap(),
            ManifestRef::Tag(Tag::new("latest"))
        );
        assert_eq!(
            "sha256:abc".parse::<ManifestRef>().unwrap(),
            ManifestRef::Digest(Digest::sha256("abc"))
        );
        assert!("sha256:".parse::<ManifestRef>().is_err());
        assert_eq!(
            ManifestRef::from(Digest::sha256("abc")).to_string(),
            "sha256:abc"
        );
    }

    #[test]
    fn names_order_lexicographically() {
        let mut tags = vec![Tag::new("two"), Tag::new("one"), Tag::new("three")];
        tags.sort();
        assert_eq!(tags, vec![Tag::new("one"), Tag::new("three"), Tag::new("two")]);
        assert_eq!(serde_json::to_string(&RepoName::new("a/b")).unwrap(), r#""a/b""#);
    }
}
