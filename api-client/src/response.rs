//! Responses from the upstream API.

use bytes::Bytes;
use futures::Stream;
use http_body_util::BodyExt as _;
use hyperdriver::Body;

use crate::error::{Error, HttpResponseError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Extension trait for working with HTTP response types.
pub trait ResponseExt {
    /// Get the status code of the response.
    fn status(&self) -> http::StatusCode;

    /// Get the headers of the response.
    fn headers(&self) -> &http::HeaderMap;

    /// The declared `Content-Length`, if present and well formed.
    fn content_length(&self) -> Option<u64> {
        self.headers()
            .get(http::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

/// A response head together with the request that produced it, and the
/// still unread body.
#[derive(Debug)]
pub struct Response {
    request: http::request::Parts,
    response: http::response::Parts,
    body: Body,
}

impl Response {
    /// Create a new `Response` instance.
    pub fn new(request: http::request::Parts, response: http::response::Response<Body>) -> Self {
        let (response, body) = response.into_parts();

        Self {
            request,
            response,
            body,
        }
    }

    /// The URI of the request that generated this response.
    pub fn uri(&self) -> &http::Uri {
        &self.request.uri
    }

    /// Consume the response, yielding body data frames as they arrive.
    ///
    /// Nothing is buffered: a transfer error after the head shows up as an
    /// `Err` item of the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static {
        self.body.into_data_stream()
    }

    /// Collect the whole body.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        let collected = self
            .body
            .collect()
            .await
            .map_err(|err| Error::ResponseBody(err.into()))?;
        Ok(collected.to_bytes())
    }

    /// Collect the body as UTF-8 text.
    pub async fn text(self) -> Result<String, Error> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|err| Error::ResponseBody(err.into()))
    }

    /// Collect the body and deserialize it as JSON.
    pub async fn json<T>(self) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| Error::ResponseBody(err.into()))
    }

    /// Convert the `Response` into an `HttpResponseError` instance.
    pub async fn into_error(self) -> HttpResponseError {
        HttpResponseError::from_response(self).await
    }

    /// Turn any status other than `expected` into an error.
    pub async fn expect_status(self, expected: http::StatusCode) -> Result<Self, Error> {
        if self.status() == expected {
            Ok(self)
        } else {
            Err(Error::Response(self.into_error().await))
        }
    }
}

impl ResponseExt for Response {
    fn status(&self) -> http::StatusCode {
        self.response.status
    }

    fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt as _;

    use super::*;

    fn response(status: http::StatusCode, length: Option<&str>, body: &'static str) -> Response {
        let request = crate::request::parts(&http::Request::new(()));
        let mut builder = http::Response::builder().status(status);
        if let Some(length) = length {
            builder = builder.header(http::header::CONTENT_LENGTH, length);
        }
        Response::new(
            request,
            builder.body(Body::from(Bytes::from_static(body.as_bytes()))).unwrap(),
        )
    }

    #[test]
    fn content_length_is_parsed() {
        assert_eq!(
            response(http::StatusCode::OK, Some("4"), "data").content_length(),
            Some(4)
        );
        assert_eq!(
            response(http::StatusCode::OK, Some("four"), "data").content_length(),
            None
        );
        assert_eq!(response(http::StatusCode::OK, None, "").content_length(), None);
    }

    #[tokio::test]
    async fn body_streams_and_collects() {
        let chunks: Vec<Bytes> = response(http::StatusCode::OK, None, "payload")
            .into_stream()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"payload");

        let value: serde_json::Value = response(http::StatusCode::OK, None, r#"{"a":1}"#)
            .json()
            .await
            .unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn unexpected_status_becomes_error() {
        let err = response(http::StatusCode::NOT_FOUND, None, "nope")
            .expect_status(http::StatusCode::OK)
            .await
            .unwrap_err();
        match err {
            Error::Response(err) => {
                assert_eq!(err.status, http::StatusCode::NOT_FOUND);
                assert_eq!(err.message, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
