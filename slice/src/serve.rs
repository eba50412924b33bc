//! Slices that serve a [`Storage`] directly.
//!
//! These are the local-origin building blocks: a mirror composes a
//! `DownloadSlice` over its own storage with proxy slices for its
//! upstreams and hands the lot to [`GroupSlice`](crate::GroupSlice).

use percent_encoding::percent_decode_str;
use storage::{Content, Key, Storage};

use crate::{Error, Headers, RequestLine, Response, Slice};

fn key_from_path(line: &RequestLine) -> Result<Key, Error> {
    let path = percent_decode_str(line.uri().path())
        .decode_utf8()
        .map_err(|err| Error::InvalidRequest(format!("request path: {err}")))?;
    let key = Key::from(path.as_ref());
    if key.is_root() {
        return Err(Error::InvalidRequest("request path names no key".into()));
    }
    Ok(key)
}

/// GET handler serving stored values by key.
///
/// The request path, percent-decoded, is the key. A missing key answers
/// `404` — absence is an expected outcome, not a failure — while a broken
/// backend fails the future.
#[derive(Debug)]
pub struct DownloadSlice<S> {
    storage: S,
}

impl<S> DownloadSlice<S> {
    /// Serve values from `storage`.
    pub fn new(storage: S) -> Self {
        DownloadSlice { storage }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Slice for DownloadSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        _headers: &Headers,
        _body: Content,
    ) -> Result<Response, Error> {
        let key = key_from_path(line)?;
        match self.storage.value(&key).await {
            Ok(content) => Ok(Response::ok().body(content)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(%key, "not in this origin");
                Ok(Response::not_found())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// PUT handler storing the request body at the key named by the path.
#[derive(Debug)]
pub struct UploadSlice<S> {
    storage: S,
}

impl<S> UploadSlice<S> {
    /// Store uploads into `storage`.
    pub fn new(storage: S) -> Self {
        UploadSlice { storage }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Slice for UploadSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        _headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        let key = key_from_path(line)?;
        self.storage.save(&key, body).await?;
        tracing::debug!(%key, "stored upload");
        Ok(Response::created())
    }
}

/// DELETE handler removing the key named by the path.
#[derive(Debug)]
pub struct DeleteSlice<S> {
    storage: S,
}

impl<S> DeleteSlice<S> {
    /// Delete keys from `storage`.
    pub fn new(storage: S) -> Self {
        DeleteSlice { storage }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Slice for DeleteSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        _headers: &Headers,
        _body: Content,
    ) -> Result<Response, Error> {
        let key = key_from_path(line)?;
        match self.storage.delete(&key).await {
            Ok(()) => Ok(Response::no_content()),
            Err(err) if err.is_not_found() => Ok(Response::not_found()),
            Err(err) => Err(err.into()),
        }
    }
}
