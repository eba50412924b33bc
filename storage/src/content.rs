use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{stream, Stream, StreamExt};

/// A boxed stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// A lazily-produced byte stream with an optional known length.
///
/// `Content` is single-consumption: every consumer takes it by value, so
/// once a stream has been read there is no handle left to read it again.
/// Duplicating content means buffering it first (see
/// [`into_bytes`](Content::into_bytes)) and building fresh values from the
/// bytes.
///
/// Dropping a `Content` without reading it drops the underlying producer,
/// releasing whatever resource (file handle, connection) it holds.
pub struct Content {
    stream: ByteStream,
    size: Option<u64>,
}

impl Content {
    /// Content with a zero-length stream.
    ///
    /// An empty response body still occupies the body slot; this is the
    /// value that fills it.
    pub fn empty() -> Self {
        Content {
            stream: Box::pin(stream::empty()),
            size: Some(0),
        }
    }

    /// Content from an asynchronous producer of chunks.
    ///
    /// `size` should be `Some` only when the total length is actually
    /// known, e.g. from a `content-length` header or a file stat; proxied
    /// upstream bodies typically pass `None`.
    pub fn from_stream<S>(stream: S, size: Option<u64>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Content {
            stream: Box::pin(stream),
            size,
        }
    }

    /// The total length in bytes, when known up front.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Buffer the entire stream into one contiguous byte buffer.
    ///
    /// Only safe when the size is bounded and trusted. A producer failure
    /// mid-stream surfaces as the error; the bytes read so far are
    /// discarded.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        let mut stream = self.stream;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Surrender the underlying chunk stream.
    pub fn into_stream(self) -> ByteStream {
        self.stream
    }

    /// Repartition into chunks of at most `max` bytes.
    ///
    /// Byte order, total length, and the declared size are preserved;
    /// only the chunk boundaries change. Chunks are drawn from the
    /// producer on demand, so no unbounded buffering happens here.
    ///
    /// # Panics
    ///
    /// Panics if `max` is zero.
    pub fn chunked(self, max: usize) -> Content {
        assert!(max > 0, "chunk size must be positive");
        let size = self.size;
        let chunks = stream::unfold(
            (self.stream, Bytes::new(), false),
            move |(mut inner, mut pending, failed)| async move {
                if failed {
                    return None;
                }
                if pending.is_empty() {
                    loop {
                        match inner.next().await {
                            Some(Ok(chunk)) if chunk.is_empty() => continue,
                            Some(Ok(chunk)) => {
                                pending = chunk;
                                break;
                            }
                            Some(Err(err)) => {
                                return Some((Err(err), (inner, Bytes::new(), true)))
                            }
                            None => return None,
                        }
                    }
                }
                let take = pending.split_to(max.min(pending.len()));
                Some((Ok(take), (inner, pending, false)))
            },
        );
        Content::from_stream(chunks, size)
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        let size = bytes.len() as u64;
        Content {
            stream: Box::pin(stream::once(async move { Ok(bytes) })),
            size: Some(size),
        }
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<&'static [u8]> for Content {
    fn from(bytes: &'static [u8]) -> Self {
        Bytes::from_static(bytes).into()
    }
}

impl From<&'static str> for Content {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content").field("size", &self.size).finish()
    }
}
