use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{Content, Key, KeyLocks, Storage, StorageError, StorageResult};

/// Storage backend that keeps everything in memory.
///
/// The primary test double, and a valid backend for small repositories.
/// Values are published by replacing the map entry under a write lock, so
/// a save is a single visible transition. A key and its child may coexist
/// here; nothing in the map structure forbids it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<Key, Bytes>>,
    locks: KeyLocks,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, key: &Key) -> StorageResult<bool> {
        Ok(self.items.read().await.contains_key(key))
    }

    async fn value(&self, key: &Key) -> StorageResult<Content> {
        let items = self.items.read().await;
        let bytes = items
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))?;
        Ok(Content::from(bytes))
    }

    async fn save(&self, key: &Key, content: Content) -> StorageResult<()> {
        let bytes = content
            .into_bytes()
            .await
            .map_err(|err| StorageError::io(key, err))?;
        let mut items = self.items.write().await;
        items.insert(key.clone(), bytes);
        Ok(())
    }

    async fn rename(&self, src: &Key, dst: &Key) -> StorageResult<()> {
        let mut items = self.items.write().await;
        let bytes = items
            .remove(src)
            .ok_or_else(|| StorageError::not_found(src))?;
        items.insert(dst.clone(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> StorageResult<()> {
        let mut items = self.items.write().await;
        items
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn list(&self, prefix: &Key) -> StorageResult<Vec<Key>> {
        let items = self.items.read().await;
        Ok(items
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn locks(&self) -> &KeyLocks {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_value_returns_exact_bytes() {
        let storage = MemoryStorage::new();
        let key = Key::from("pkg/1.0.0/pkg.tgz");
        storage.save(&key, Content::from("tarball bytes")).await.unwrap();

        let bytes = storage.value(&key).await.unwrap().into_bytes().await.unwrap();
        assert_eq!(bytes, "tarball bytes");
    }

    #[tokio::test]
    async fn save_overwrites_previous_value() {
        let storage = MemoryStorage::new();
        let key = Key::from("k");
        storage.save(&key, Content::from("old")).await.unwrap();
        storage.save(&key, Content::from("new")).await.unwrap();

        let bytes = storage.value(&key).await.unwrap().into_bytes().await.unwrap();
        assert_eq!(bytes, "new");
    }

    #[tokio::test]
    async fn absence_is_not_found_not_failure() {
        let storage = MemoryStorage::new();
        let key = Key::from("missing");

        assert!(!storage.exists(&key).await.unwrap());
        assert!(storage.value(&key).await.unwrap_err().is_not_found());
        assert!(storage.delete(&key).await.unwrap_err().is_not_found());
        assert!(storage
            .rename(&key, &Key::from("elsewhere"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn delete_then_exists_is_false() {
        let storage = MemoryStorage::new();
        let key = Key::from("k");
        storage.save(&key, Content::from("v")).await.unwrap();
        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn rename_moves_the_value() {
        let storage = MemoryStorage::new();
        let src = Key::from("staging/artifact");
        let dst = Key::from("published/artifact");
        storage.save(&src, Content::from("payload")).await.unwrap();

        storage.rename(&src, &dst).await.unwrap();

        assert!(!storage.exists(&src).await.unwrap());
        assert!(storage.exists(&dst).await.unwrap());
        let bytes = storage.value(&dst).await.unwrap().into_bytes().await.unwrap();
        assert_eq!(bytes, "payload");
    }

    #[tokio::test]
    async fn list_is_prefix_filtered_and_ordered() {
        let storage = MemoryStorage::new();
        for path in ["b/2", "a/2", "a/10", "a/1/x", "c"] {
            storage.save(&Key::from(path), Content::empty()).await.unwrap();
        }

        let keys = storage.list(&Key::from("a")).await.unwrap();
        assert_eq!(
            keys,
            vec![Key::from("a/1/x"), Key::from("a/10"), Key::from("a/2")]
        );

        let all = storage.list(&Key::root()).await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
