use std::fmt;

use http::uri::InvalidUri;
use http::{Method, Uri, Version};

/// The first line of an inbound request: method, target, and protocol
/// version.
///
/// An immutable value created per request; the transport binding builds
/// one from wire bytes, decorators may derive modified copies (see
/// [`PrefixedSlice`](crate::PrefixedSlice)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    uri: Uri,
    version: Version,
}

impl RequestLine {
    /// A request line for `method` and `target`, defaulting to HTTP/1.1.
    ///
    /// # Errors
    ///
    /// Fails when `target` is not a valid URI.
    pub fn new(method: Method, target: &str) -> Result<Self, InvalidUri> {
        Ok(RequestLine {
            method,
            uri: target.parse()?,
            version: Version::HTTP_11,
        })
    }

    /// A GET request line for `target`.
    pub fn get(target: &str) -> Result<Self, InvalidUri> {
        RequestLine::new(Method::GET, target)
    }

    /// The same request line with a different target URI.
    pub fn with_uri(&self, uri: Uri) -> Self {
        RequestLine {
            method: self.method.clone(),
            uri,
            version: self.version,
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URI (path and query).
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The protocol version token.
    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.method, self.uri, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_like_a_wire_request_line() {
        let line = RequestLine::get("/pkg/meta.json?rev=2").unwrap();
        assert_eq!(line.to_string(), "GET /pkg/meta.json?rev=2 HTTP/1.1");
    }

    #[test]
    fn rejects_invalid_targets() {
        assert!(RequestLine::get("no spaces allowed").is_err());
    }

    #[test]
    fn with_uri_preserves_method_and_version() {
        let line = RequestLine::new(Method::PUT, "/a").unwrap();
        let moved = line.with_uri("/b".parse().unwrap());
        assert_eq!(moved.method(), &Method::PUT);
        assert_eq!(moved.uri().path(), "/b");
        assert_eq!(moved.version(), Version::HTTP_11);
    }
}
