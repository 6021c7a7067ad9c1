//! Request building.

use http::{header::HeaderValue, HeaderName, Uri};

use crate::{response::Response, ApiClient};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T, E = BoxError> = std::result::Result<T, E>;

/// Copy the method, URI and headers of a request, so they can travel with
/// the response after the body has been consumed.
pub(crate) fn parts<B>(req: &http::Request<B>) -> http::request::Parts {
    let (mut parts, _) = http::Request::new(()).into_parts();
    parts.method = req.method().clone();
    parts.uri = req.uri().clone();
    parts.headers = req.headers().clone();
    parts
}

/// Builder for a single request against an [`ApiClient`].
#[derive(Debug)]
pub struct RequestBuilder {
    req: http::request::Builder,
    uri: Result<Uri, http::Error>,
    client: ApiClient,
}

impl RequestBuilder {
    /// Start a request with `method` at `uri`. An invalid `uri` fails at
    /// [`RequestBuilder::send`].
    pub(crate) fn new(
        client: ApiClient,
        uri: Result<Uri, http::Error>,
        method: http::Method,
    ) -> Self {
        Self {
            req: http::Request::builder().method(method),
            uri,
            client,
        }
    }

    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.req = self.req.header(key, value);
        self
    }

    /// Send the request.
    ///
    /// Resolves once the response head has arrived; any status is returned
    /// as a response, not an error.
    pub async fn send(self) -> Result<Response> {
        let req = self.req.uri(self.uri?).body(hyperdriver::Body::empty())?;
        Ok(self.client.execute(req).await?)
    }
}
