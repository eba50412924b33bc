//! # Key-addressed storage
//!
//! The storage substrate of the artifact repository: a [`Storage`] trait
//! over key-addressed byte [`Content`], with per-key exclusive leases for
//! multi-step updates and two backends behind the same contract.
//!
//! Backends publish saves atomically and report absence as a typed
//! [`StorageError::NotFound`] rather than a generic failure, so callers
//! can always tell "no value" from "broken backend".

pub(crate) mod config;
pub(crate) mod content;
pub(crate) mod error;
pub(crate) mod key;
pub(crate) mod local;
pub(crate) mod lock;
pub(crate) mod memory;
pub(crate) mod storage;

#[doc(inline)]
pub use config::StorageConfig;
#[doc(inline)]
pub use content::{ByteStream, Content};
#[doc(inline)]
pub use error::{StorageError, StorageResult};
#[doc(inline)]
pub use key::Key;
#[doc(inline)]
pub use local::LocalStorage;
#[doc(inline)]
pub use lock::{KeyLocks, Lease};
#[doc(inline)]
pub use memory::MemoryStorage;
#[doc(inline)]
pub use storage::{Storage, StorageExt};
