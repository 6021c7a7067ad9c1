//! Streamed content of blobs, upload chunks and manifests.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt as _, TryStreamExt as _};
use storage::ByteStream;

/// A byte stream with an optional declared size.
pub struct Content {
    size: Option<u64>,
    stream: ByteStream,
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content").field("size", &self.size).finish()
    }
}

impl Content {
    /// Wrap a stream, with its size if known.
    pub fn new(stream: ByteStream, size: Option<u64>) -> Self {
        Self { size, stream }
    }

    /// The declared size, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Drop the size and return the raw stream.
    pub fn into_stream(self) -> ByteStream {
        self.stream
    }

    /// Read the whole stream into memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        let mut chunks: Vec<Bytes> = self.stream.try_collect().await?;
        if chunks.len() == 1 {
            return Ok(chunks.swap_remove(0));
        }
        Ok(chunks.concat().into())
    }
}

impl From<Bytes> for Content {
    fn from(value: Bytes) -> Self {
        let size = value.len() as u64;
        let stream = futures::stream::once(async move { Ok::<_, io::Error>(value) }).boxed();
        Self::new(stream, Some(size))
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Bytes::from(value).into()
    }
}

impl From<&'static [u8]> for Content {
    fn from(value: &'static [u8]) -> Self {
        Bytes::from_static(value).into()
    }
}

impl From<&'static str> for Content {
    fn from(value: &'static str) -> Self {
        Bytes::from_static(value.as_bytes()).into()
    }
}

impl Stream for Content {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_chunks() {
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ])
        .boxed();
        let content = Content::new(chunks, None);
        assert_eq!(content.size(), None);
        assert_eq!(&content.into_bytes().await.unwrap()[..], b"abcd");
    }

    #[tokio::test]
    async fn stream_errors_surface() {
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("connection reset")),
        ])
        .boxed();
        let err = Content::new(chunks, Some(4)).into_bytes().await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn from_bytes_has_size() {
        let content = Content::from("hello");
        assert_eq!(content.size(), Some(5));

        let mut content = content;
        assert_eq!(content.next().await.unwrap().unwrap(), "hello");
        assert!(content.next().await.is_none());
    }
}
