use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use storage::Content;

use crate::{Error, Headers, RequestLine, Response};

/// The unit of request handling.
///
/// A slice is a pure function from request to asynchronously-produced
/// response. All adapters, proxies, and decorators implement this one
/// contract; composition is wrapping, not inheritance.
///
/// Implementations must not block the calling thread: blocking work is
/// expressed as suspension inside the returned future. Per-request state
/// belongs to injected collaborators (a [`storage::Storage`], an upstream
/// client), never to the slice itself.
///
/// A failed future is a transport-level failure, distinct from a response
/// carrying an error status; see [`Error`].
#[async_trait::async_trait]
pub trait Slice: Send + Sync {
    /// Produce the response for one request.
    ///
    /// `body` is single-consumption [`Content`]; the slice owns it.
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<S> Slice for Arc<S>
where
    S: ?Sized + Slice,
{
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        (**self).response(line, headers, body).await
    }
}

#[async_trait::async_trait]
impl<S> Slice for &S
where
    S: ?Sized + Slice,
{
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        (**self).response(line, headers, body).await
    }
}

#[async_trait::async_trait]
impl<S> Slice for Box<S>
where
    S: ?Sized + Slice,
{
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        (**self).response(line, headers, body).await
    }
}

/// A slice that always answers with the same status and body bytes.
///
/// The stub origin for composition and tests, and the building block for
/// fixed fallback responses.
#[derive(Debug, Clone)]
pub struct StatusSlice {
    status: StatusCode,
    body: Bytes,
}

impl StatusSlice {
    /// A slice answering `status` with an empty body.
    pub fn new(status: StatusCode) -> Self {
        StatusSlice {
            status,
            body: Bytes::new(),
        }
    }

    /// A slice answering `status` with `body`.
    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        StatusSlice {
            status,
            body: body.into(),
        }
    }
}

#[async_trait::async_trait]
impl Slice for StatusSlice {
    async fn response(
        &self,
        _line: &RequestLine,
        _headers: &Headers,
        _body: Content,
    ) -> Result<Response, Error> {
        Ok(Response::with_status(self.status).body(Content::from(self.body.clone())))
    }
}

/// Decorator that traces every request through the inner slice.
#[derive(Debug)]
pub struct LoggedSlice<S> {
    inner: S,
}

impl<S> LoggedSlice<S> {
    /// Wrap `inner` with request/response logging.
    pub fn new(inner: S) -> Self {
        LoggedSlice { inner }
    }
}

#[async_trait::async_trait]
impl<S: Slice> Slice for LoggedSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        let started = tokio::time::Instant::now();
        tracing::debug!(%line, "request");
        let result = self.inner.response(line, headers, body).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(response) => {
                tracing::info!(%line, status = %response.status(), ?elapsed, "response")
            }
            Err(error) => tracing::warn!(%line, %error, ?elapsed, "transport failure"),
        }
        result
    }
}

/// Decorator that prepends a path prefix before delegating.
///
/// Method, query string, headers, and body pass through untouched; the
/// raw (still percent-encoded) path is prefixed as-is.
#[derive(Debug)]
pub struct PrefixedSlice<S> {
    prefix: String,
    inner: S,
}

impl<S> PrefixedSlice<S> {
    /// Wrap `inner`, prefixing every request path with `prefix`.
    ///
    /// `prefix` should be empty or start with `/` and carry no trailing
    /// slash, e.g. `/my/repo`.
    pub fn new(prefix: impl Into<String>, inner: S) -> Self {
        PrefixedSlice {
            prefix: prefix.into(),
            inner,
        }
    }
}

#[async_trait::async_trait]
impl<S: Slice> Slice for PrefixedSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        let uri = line.uri();
        let mut target = format!("{}{}", self.prefix, uri.path());
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }
        let uri = target
            .parse()
            .map_err(|err| Error::InvalidRequest(format!("prefixed target: {err}")))?;
        self.inner.response(&line.with_uri(uri), headers, body).await
    }
}

/// Decorator that bounds how long the inner slice may take.
///
/// The race in [`GroupSlice`](crate::GroupSlice) waits for every
/// candidate to settle before giving up; wrapping a candidate in a
/// `TimeoutSlice` keeps one stalled origin from pinning the whole group.
/// An elapsed deadline resolves as a transport failure.
#[derive(Debug)]
pub struct TimeoutSlice<S> {
    inner: S,
    deadline: Duration,
}

impl<S> TimeoutSlice<S> {
    /// Wrap `inner` with a per-request deadline.
    pub fn new(inner: S, deadline: Duration) -> Self {
        TimeoutSlice { inner, deadline }
    }
}

#[async_trait::async_trait]
impl<S: Slice> Slice for TimeoutSlice<S> {
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        match tokio::time::timeout(self.deadline, self.inner.response(line, headers, body)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no response within {:?}", self.deadline),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Slice);

    #[tokio::test]
    async fn status_slice_answers_every_request_alike() {
        let slice = StatusSlice::with_body(StatusCode::OK, "pong");
        for target in ["/", "/deep/path?q=1"] {
            let response = slice
                .response(
                    &RequestLine::get(target).unwrap(),
                    &Headers::new(),
                    Content::empty(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.into_body().into_bytes().await.unwrap(), "pong");
        }
    }

    /// The prefix cases a registry proxy depends on, including encoded
    /// segments and query preservation.
    #[tokio::test]
    async fn prefixed_slice_rewrites_only_the_path() {
        let cases = [
            ("", "/", "/", None),
            ("/prefix", "/", "/prefix/", None),
            ("/a/b/c", "/d/e/f", "/a/b/c/d/e/f", None),
            (
                "/my/repo",
                "/123/file.txt?param1=foo&param2=bar",
                "/my/repo/123/file.txt",
                Some("param1=foo&param2=bar"),
            ),
            (
                "/aaa/bbb",
                "/%26/file.txt?p=%20%20",
                "/aaa/bbb/%26/file.txt",
                Some("p=%20%20"),
            ),
        ];
        for (prefix, target, path, query) in cases {
            let checker = CheckSlice {
                path: path.to_string(),
                query: query.map(String::from),
            };
            PrefixedSlice::new(prefix, checker)
                .response(
                    &RequestLine::get(target).unwrap(),
                    &Headers::new(),
                    Content::from("request body"),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn logged_slice_is_transparent_to_the_exchange() {
        let slice = LoggedSlice::new(StatusSlice::with_body(StatusCode::IM_A_TEAPOT, "short"));
        let response = slice
            .response(
                &RequestLine::get("/tea").unwrap(),
                &Headers::new(),
                Content::empty(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.into_body().into_bytes().await.unwrap(), "short");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_slice_turns_a_stall_into_transport_failure() {
        let stalled = TimeoutSlice::new(NeverSlice, Duration::from_secs(1));
        let err = stalled
            .response(
                &RequestLine::get("/").unwrap(),
                &Headers::new(),
                Content::empty(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn timeout_slice_passes_a_prompt_response_through() {
        let slice = TimeoutSlice::new(
            StatusSlice::with_body(StatusCode::OK, "quick"),
            Duration::from_secs(1),
        );
        let response = slice
            .response(
                &RequestLine::get("/").unwrap(),
                &Headers::new(),
                Content::empty(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    struct CheckSlice {
        path: String,
        query: Option<String>,
    }

    #[async_trait::async_trait]
    impl Slice for CheckSlice {
        async fn response(
            &self,
            line: &RequestLine,
            _headers: &Headers,
            body: Content,
        ) -> Result<Response, Error> {
            assert_eq!(line.uri().path(), self.path);
            assert_eq!(line.uri().query(), self.query.as_deref());
            assert_eq!(line.method(), &http::Method::GET);
            assert_eq!(body.into_bytes().await.unwrap(), "request body");
            Ok(Response::ok())
        }
    }

    struct NeverSlice;

    #[async_trait::async_trait]
    impl Slice for NeverSlice {
        async fn response(
            &self,
            _line: &RequestLine,
            _headers: &Headers,
            _body: Content,
        ) -> Result<Response, Error> {
            futures::future::pending().await
        }
    }
}
