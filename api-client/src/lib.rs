//! A thin HTTP client for talking to an upstream registry.
//!
//! One request in, one response out: status, headers and a streamed body.
//! Retry and authentication policies are deliberately left to the caller.

use std::sync::Arc;

use http::Method;
use http::Uri;
use hyperdriver::service::SharedService;
use tower::ServiceExt;

mod error;
pub mod request;
pub mod response;
pub mod uri;

pub use self::error::{Error, HttpResponseError};
pub use self::request::RequestBuilder;
pub use self::response::Response as ApiResponse;
use self::uri::UriExtension as _;

/// A client for accessing an HTTP API rooted at a base URI.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Arc<Uri>,
    inner: hyperdriver::client::SharedClientService<hyperdriver::Body, hyperdriver::Body>,
}

impl ApiClient {
    /// Create a new API client for a base URI, using a TCP + TLS transport.
    pub fn new(base: Uri) -> Self {
        let inner = hyperdriver::Client::build_tcp_http()
            .with_default_tls()
            .build_service();

        ApiClient {
            base: Arc::new(base),
            inner,
        }
    }

    /// Create a new API client which sends requests through `inner`.
    ///
    /// Used to plug in a custom transport, or [`mock::MockService`] in tests.
    pub fn new_with_inner_service<S>(base: Uri, inner: S) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .service(inner);

        ApiClient {
            base: Arc::new(base),
            inner: service,
        }
    }

    /// The base URI requests are resolved against.
    pub fn base(&self) -> &Uri {
        &self.base
    }

    fn endpoint(&self, endpoint: &str) -> Result<Uri, http::Error> {
        (*self.base).clone().join(endpoint)
    }

    /// Start a GET request.
    pub fn get(&self, endpoint: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), self.endpoint(endpoint), Method::GET)
    }

    /// Start a HEAD request.
    pub fn head(&self, endpoint: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), self.endpoint(endpoint), Method::HEAD)
    }

    /// Send a request and wait for the response head.
    ///
    /// The body is not read; it is handed back as part of the response.
    #[tracing::instrument(level = "trace", skip_all, fields(method = %req.method(), uri = %req.uri()))]
    pub async fn execute(
        &self,
        req: http::Request<hyperdriver::Body>,
    ) -> Result<ApiResponse, hyperdriver::client::Error> {
        let parts = request::parts(&req);

        let response = self.inner.clone().oneshot(req).await?;
        tracing::trace!(status = %response.status(), "received response head");
        Ok(ApiResponse::new(parts, response))
    }
}

/// A canned-response transport for tests.
pub mod mock {
    use bytes::Bytes;
    use http::response;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// A response the mock will replay.
    #[derive(Debug, Clone)]
    pub struct MockResponse {
        status: http::StatusCode,
        headers: http::HeaderMap,
        body: Vec<u8>,
    }

    impl MockResponse {
        /// Create a canned response.
        pub fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
            Self {
                status,
                headers,
                body,
            }
        }
    }

    /// A request the mock has seen.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Recorded {
        /// Request method.
        pub method: http::Method,
        /// Request path and query.
        pub path_and_query: String,
    }

    /// A transport which answers by request path.
    ///
    /// Paths without a configured response get `404 Not Found`, which is
    /// what a registry answers for unknown repositories and digests.
    #[derive(Debug, Default, Clone)]
    pub struct MockService {
        responses: HashMap<String, MockResponse>,
        recorded: Arc<Mutex<Vec<Recorded>>>,
    }

    impl MockService {
        /// Create an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure the response for `path` (query ignored).
        pub fn add(
            &mut self,
            path: &str,
            status: http::StatusCode,
            headers: http::HeaderMap,
            body: Vec<u8>,
        ) {
            let response = MockResponse::new(status, headers, body);
            self.responses.insert(path.to_owned(), response);
        }

        /// Requests received so far, in order.
        pub fn requests(&self) -> Vec<Recorded> {
            self.recorded
                .lock()
                .map(|recorded| recorded.clone())
                .unwrap_or_default()
        }
    }

    impl tower::Service<http::Request<hyperdriver::Body>> for MockService {
        type Response = http::Response<hyperdriver::Body>;
        type Error = hyperdriver::client::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<hyperdriver::Body>) -> Self::Future {
            let path = req.uri().path().to_owned();
            if let Ok(mut recorded) = self.recorded.lock() {
                recorded.push(Recorded {
                    method: req.method().clone(),
                    path_and_query: req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.as_str().to_owned())
                        .unwrap_or_default(),
                });
            }

            let not_found = MockResponse::new(
                http::StatusCode::NOT_FOUND,
                http::HeaderMap::new(),
                Vec::new(),
            );
            let response = self.responses.get(&path).unwrap_or(&not_found);

            let mut builder = response::Builder::new()
                .status(response.status)
                .version(http::Version::HTTP_11);

            for (key, value) in response.headers.iter() {
                builder = builder.header(key, value);
            }

            let response = builder
                .body(hyperdriver::Body::from(Bytes::from(response.body.clone())))
                .expect("mock response parts are valid");

            std::future::ready(Ok(response))
        }
    }
}
