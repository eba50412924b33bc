use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use http::StatusCode;
use storage::Content;

use crate::Headers;

/// A response: status, headers, and a body stream.
///
/// Produced exactly once per request. An empty body still occupies the
/// body slot as a zero-length [`Content`].
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Content,
}

impl Response {
    /// A response with the given status and an empty body.
    pub fn with_status(status: StatusCode) -> Self {
        Response {
            status,
            headers: Headers::new(),
            body: Content::empty(),
        }
    }

    /// `200 OK` with an empty body.
    pub fn ok() -> Self {
        Response::with_status(StatusCode::OK)
    }

    /// `201 Created` with an empty body.
    pub fn created() -> Self {
        Response::with_status(StatusCode::CREATED)
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Response::with_status(StatusCode::NO_CONTENT)
    }

    /// The canonical `404 Not Found`.
    pub fn not_found() -> Self {
        Response::with_status(StatusCode::NOT_FOUND)
    }

    /// Add a header, keeping any values already present under the name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the body, setting `content-length` when the size is known.
    pub fn body(mut self, body: Content) -> Self {
        if let Some(size) = body.size() {
            self.headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
        }
        self.body = body;
        self
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Consume the response, surrendering the body.
    pub fn into_body(self) -> Content {
        self.body
    }

    /// Consume the response into its parts.
    pub fn into_parts(self) -> (StatusCode, Headers, Content) {
        (self.status, self.headers, self.body)
    }
}
