use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use crate::{Content, Key, KeyLocks, StorageResult};

/// A key-addressed asynchronous store of [`Content`].
///
/// All operations may suspend; none may block the calling thread. Absence
/// is reported as [`StorageError::NotFound`](crate::StorageError::NotFound),
/// never conflated with I/O failure.
#[async_trait::async_trait]
pub trait Storage: fmt::Debug + Send + Sync {
    /// Whether a value is stored at `key`.
    async fn exists(&self, key: &Key) -> StorageResult<bool>;

    /// The value stored at `key`.
    ///
    /// Fails with `NotFound` if the key has no stored value.
    async fn value(&self, key: &Key) -> StorageResult<Content>;

    /// Store `content` at `key`, replacing any existing value.
    ///
    /// The new value is published as a single visible transition: a
    /// concurrent `value` or `exists` observes either the old state or the
    /// new one, never a partial write.
    async fn save(&self, key: &Key, content: Content) -> StorageResult<()>;

    /// Move the value at `src` to `dst`, overwriting `dst`.
    ///
    /// Fails with `NotFound` if `src` is absent.
    async fn rename(&self, src: &Key, dst: &Key) -> StorageResult<()>;

    /// Remove the value at `key`.
    ///
    /// Fails with `NotFound` if `key` is absent.
    async fn delete(&self, key: &Key) -> StorageResult<()>;

    /// All keys starting with `prefix`, in lexicographic segment order.
    async fn list(&self, prefix: &Key) -> StorageResult<Vec<Key>>;

    /// The per-key lease registry of this storage instance.
    ///
    /// Backends hold one registry for their whole lifetime so that every
    /// caller of [`StorageExt::exclusively`] contends on the same leases.
    fn locks(&self) -> &KeyLocks;
}

#[async_trait::async_trait]
impl<S> Storage for Arc<S>
where
    S: ?Sized + Storage,
{
    async fn exists(&self, key: &Key) -> StorageResult<bool> {
        self.deref().exists(key).await
    }

    async fn value(&self, key: &Key) -> StorageResult<Content> {
        self.deref().value(key).await
    }

    async fn save(&self, key: &Key, content: Content) -> StorageResult<()> {
        self.deref().save(key, content).await
    }

    async fn rename(&self, src: &Key, dst: &Key) -> StorageResult<()> {
        self.deref().rename(src, dst).await
    }

    async fn delete(&self, key: &Key) -> StorageResult<()> {
        self.deref().delete(key).await
    }

    async fn list(&self, prefix: &Key) -> StorageResult<Vec<Key>> {
        self.deref().list(prefix).await
    }

    fn locks(&self) -> &KeyLocks {
        self.deref().locks()
    }
}

#[async_trait::async_trait]
impl<S> Storage for &S
where
    S: ?Sized + Storage,
{
    async fn exists(&self, key: &Key) -> StorageResult<bool> {
        (**self).exists(key).await
    }

    async fn value(&self, key: &Key) -> StorageResult<Content> {
        (**self).value(key).await
    }

    async fn save(&self, key: &Key, content: Content) -> StorageResult<()> {
        (**self).save(key, content).await
    }

    async fn rename(&self, src: &Key, dst: &Key) -> StorageResult<()> {
        (**self).rename(src, dst).await
    }

    async fn delete(&self, key: &Key) -> StorageResult<()> {
        (**self).delete(key).await
    }

    async fn list(&self, prefix: &Key) -> StorageResult<Vec<Key>> {
        (**self).list(prefix).await
    }

    fn locks(&self) -> &KeyLocks {
        (**self).locks()
    }
}

/// Extension methods for [`Storage`] that need generic signatures and so
/// cannot live on the object-safe trait.
pub trait StorageExt: Storage {
    /// Run `section` while holding the exclusive lease for `key`.
    ///
    /// At most one critical section per key is in flight on this storage
    /// instance; a second caller for the same key queues behind the first
    /// and runs only after the lease is released. Distinct keys proceed
    /// independently. The lease is released when the returned future
    /// completes, whether by success, failure, or being dropped mid-way.
    fn exclusively<'a, T, F, Fut>(
        &'a self,
        key: &Key,
        section: F,
    ) -> impl Future<Output = StorageResult<T>> + Send + 'a
    where
        F: FnOnce(&'a Self) -> Fut + Send + 'a,
        Fut: Future<Output = StorageResult<T>> + Send + 'a,
        T: Send + 'a,
        Self: Sized,
    {
        let key = key.clone();
        async move {
            let _lease = self.locks().acquire(key.clone()).await;
            tracing::trace!(%key, "entering exclusive section");
            let result = section(self).await;
            tracing::trace!(%key, "leaving exclusive section");
            result
        }
    }
}

impl<S: Storage> StorageExt for S {}
