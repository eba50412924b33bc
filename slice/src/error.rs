use std::io;

use storage::StorageError;

/// A transport-level failure from a [`Slice`](crate::Slice).
///
/// Distinct from an application-level error *status*: a slice that
/// answers `404` or `500` has still produced a response; an `Error` means
/// no response was produced at all. [`GroupSlice`](crate::GroupSlice)
/// folds both outcomes into "this candidate did not succeed", but other
/// composing layers may treat them differently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying transport failed before a response materialized.
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    /// A storage backend failed while producing the response.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The request could not be interpreted by this slice.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
