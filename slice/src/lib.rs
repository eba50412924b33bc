//! # Request handling
//!
//! The request-handling substrate of the artifact repository. Everything
//! that answers a request — format adapters, proxies, decorators — is a
//! [`Slice`]: a pure function from `(request line, headers, body)` to an
//! asynchronously-produced [`Response`].
//!
//! Transport bindings translate wire requests into these value types;
//! this crate is agnostic to framing. [`GroupSlice`] races a set of
//! candidate slices (mirrored origins) and answers with the first usable
//! response.

pub(crate) mod error;
pub(crate) mod group;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod serve;
pub(crate) mod slice;

/// Ordered multimap of header names to values.
///
/// Name equality is case-insensitive and insertion order is preserved for
/// repeated names, which matters for headers that legitimately repeat.
pub type Headers = http::HeaderMap;

#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use group::{GroupSlice, SuccessPredicate};
#[doc(inline)]
pub use request::RequestLine;
#[doc(inline)]
pub use response::Response;
#[doc(inline)]
pub use serve::{DeleteSlice, DownloadSlice, UploadSlice};
#[doc(inline)]
pub use slice::{LoggedSlice, PrefixedSlice, Slice, StatusSlice, TimeoutSlice};
