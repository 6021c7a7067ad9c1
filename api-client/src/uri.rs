//! URI utilities.

use camino::Utf8Path;
use http::Uri;

/// Serialize and Deserialize a URI to and from a string.
pub mod serde {
    use http::Uri;
    use serde::{Deserialize as _, Deserializer};

    /// Deserialize a URI from a string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Uri, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }

    /// Serialize a URI as a string
    pub fn serialize<S>(uri: &Uri, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(uri)
    }
}

/// Extension trait for URIs.
pub trait UriExtension {
    /// Join an endpoint to a URI.
    ///
    /// The endpoint path is joined to the base path (an absolute endpoint
    /// replaces it). Any query string on the endpoint replaces the query of
    /// the base URI. Fails when the joined path is not a valid URI path.
    fn join<P: AsRef<str>>(self, endpoint: P) -> Result<Uri, http::Error>;
}

impl UriExtension for Uri {
    fn join<P: AsRef<str>>(self, endpoint: P) -> Result<Uri, http::Error> {
        let (path, query) = match endpoint.as_ref().split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (endpoint.as_ref(), None),
        };

        let mut parts = self.into_parts();
        let base = parts
            .path_and_query
            .as_ref()
            .map(|pq| pq.path())
            .unwrap_or("/");

        let mut joined = Utf8Path::new(base).join(path).to_string();
        if !joined.starts_with('/') {
            joined.insert(0, '/');
        }
        if path.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        if let Some(query) = query {
            joined.push('?');
            joined.push_str(query);
        }

        parts.path_and_query = Some(http::uri::PathAndQuery::from_maybe_shared(joined)?);
        Ok(Uri::from_parts(parts)?)
    }
}
