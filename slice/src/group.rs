use std::fmt;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use http::StatusCode;
use storage::Content;

use crate::{Error, Headers, RequestLine, Response, Slice};

/// Decides whether a candidate's response settles the race.
pub type SuccessPredicate = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// A slice that races a fixed set of candidate slices and answers with
/// the first usable response.
///
/// All candidates are dispatched concurrently at call time. The earliest
/// response satisfying the success predicate wins; the remaining
/// candidates are dropped, which cancels their in-flight work. A
/// candidate that responds unsuccessfully, or whose future fails
/// outright, merely leaves the race. When every candidate has settled
/// without a winner the group answers a canonical `404`.
///
/// Two candidates becoming ready at the same instant resolve to the
/// lower-index one: pending candidates are polled in list order.
///
/// A candidate that never settles keeps the race open; wrap such origins
/// in a [`TimeoutSlice`](crate::TimeoutSlice) to bound them.
#[derive(Clone)]
pub struct GroupSlice {
    candidates: Vec<Arc<dyn Slice>>,
    predicate: SuccessPredicate,
}

impl GroupSlice {
    /// Race `candidates` with the default success predicate: any status
    /// that is not a 4xx client error wins.
    ///
    /// A `500` from an origin is therefore a winner — the origin did
    /// answer, and hiding its failure behind a `404` would misreport the
    /// artifact as absent. Use [`with_predicate`](GroupSlice::with_predicate)
    /// for a stricter policy.
    pub fn new(candidates: Vec<Arc<dyn Slice>>) -> Self {
        GroupSlice {
            candidates,
            predicate: Arc::new(|status: StatusCode| !status.is_client_error()),
        }
    }

    /// Replace the success predicate.
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }
}

#[async_trait::async_trait]
impl Slice for GroupSlice {
    async fn response(
        &self,
        line: &RequestLine,
        headers: &Headers,
        body: Content,
    ) -> Result<Response, Error> {
        if self.candidates.is_empty() {
            return Ok(Response::not_found());
        }

        // Content is single-consumption, so the body is buffered once and
        // re-materialized per candidate. Raced requests are read-style;
        // their bodies are small or empty.
        let body = body.into_bytes().await.map_err(Error::Transport)?;

        let mut pending = self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let body = Content::from(body.clone());
                async move { (index, candidate.response(line, headers, body).await) }.boxed()
            })
            .collect::<Vec<_>>();

        while !pending.is_empty() {
            let ((index, result), _, rest) = future::select_all(pending).await;
            match result {
                Ok(response) if (self.predicate)(response.status()) => {
                    tracing::debug!(%line, candidate = index, status = %response.status(), "race won");
                    // Dropping the rest cancels every still-racing candidate.
                    return Ok(response);
                }
                Ok(response) => {
                    tracing::debug!(%line, candidate = index, status = %response.status(), "candidate out")
                }
                Err(error) => {
                    // A transport failure does not abort the race; the
                    // candidate simply did not succeed.
                    tracing::debug!(%line, candidate = index, %error, "candidate failed")
                }
            }
            pending = rest;
        }

        tracing::debug!(%line, "no candidate succeeded");
        Ok(Response::not_found())
    }
}

impl fmt::Debug for GroupSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSlice")
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::StatusSlice;

    fn get() -> RequestLine {
        RequestLine::get("/artifact").unwrap()
    }

    async fn race(group: &GroupSlice) -> Response {
        group
            .response(&get(), &Headers::new(), Content::empty())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn zero_candidates_resolve_to_not_found_immediately() {
        let group = GroupSlice::new(Vec::new());
        assert_eq!(race(&group).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_success_wins() {
        let group = GroupSlice::new(vec![
            Arc::new(StatusSlice::new(StatusCode::NOT_FOUND)),
            Arc::new(StatusSlice::with_body(StatusCode::OK, "hit")),
        ]);
        let response = race(&group).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body().into_bytes().await.unwrap(), "hit");
    }

    #[tokio::test]
    async fn failing_candidate_is_treated_like_not_found() {
        let group = GroupSlice::new(vec![
            Arc::new(FaultySlice),
            Arc::new(StatusSlice::with_body(StatusCode::OK, "survivor")),
        ]);
        let response = race(&group).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body().into_bytes().await.unwrap(), "survivor");
    }

    #[tokio::test]
    async fn all_failures_resolve_to_canonical_not_found() {
        let group = GroupSlice::new(vec![
            Arc::new(FaultySlice),
            Arc::new(StatusSlice::new(StatusCode::NOT_FOUND)),
        ]);
        assert_eq!(race(&group).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn simultaneous_successes_resolve_to_the_lowest_index() {
        let group = GroupSlice::new(vec![
            Arc::new(StatusSlice::with_body(StatusCode::OK, "first")),
            Arc::new(StatusSlice::with_body(StatusCode::OK, "second")),
        ]);
        let response = race(&group).await;
        assert_eq!(response.into_body().into_bytes().await.unwrap(), "first");
    }

    #[tokio::test]
    async fn server_errors_win_under_the_default_predicate() {
        let group = GroupSlice::new(vec![
            Arc::new(StatusSlice::new(StatusCode::NOT_FOUND)),
            Arc::new(StatusSlice::new(StatusCode::INTERNAL_SERVER_ERROR)),
        ]);
        assert_eq!(race(&group).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn predicate_can_be_tightened() {
        let group = GroupSlice::new(vec![
            Arc::new(StatusSlice::new(StatusCode::INTERNAL_SERVER_ERROR)),
            Arc::new(StatusSlice::with_body(StatusCode::OK, "healthy")),
        ])
        .with_predicate(|status| status.is_success());
        let response = race(&group).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    struct FaultySlice;

    #[async_trait::async_trait]
    impl Slice for FaultySlice {
        async fn response(
            &self,
            _line: &RequestLine,
            _headers: &Headers,
            _body: Content,
        ) -> Result<Response, Error> {
            Err(Error::Transport(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "origin unreachable",
            )))
        }
    }
}
