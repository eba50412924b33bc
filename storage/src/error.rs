use std::io;

use crate::Key;

/// Result alias used throughout the storage crate.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors produced by [`Storage`](crate::Storage) operations.
///
/// Absence is a first-class, recoverable outcome and is never folded into
/// the I/O variants: callers branch on [`StorageError::is_not_found`]
/// rather than inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The key has no stored value.
    #[error("key not found: {key}")]
    NotFound {
        /// The key that was requested.
        key: Key,
    },

    /// The backend failed performing I/O for a key.
    #[error("i/o failure at {key}: {source}")]
    Io {
        /// The key the operation was addressing.
        key: Key,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The key cannot be represented by this backend.
    #[error("invalid key {key}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: Key,
        /// Why the backend rejected it.
        reason: String,
    },
}

impl StorageError {
    /// A `NotFound` error for `key`.
    pub fn not_found(key: &Key) -> Self {
        StorageError::NotFound { key: key.clone() }
    }

    /// An `Io` error for `key` wrapping `source`.
    pub fn io(key: &Key, source: io::Error) -> Self {
        StorageError::Io {
            key: key.clone(),
            source,
        }
    }

    /// Whether this error is the recoverable "no value at key" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            StorageError::Io { source, .. } => source,
            StorageError::InvalidKey { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    }
}
