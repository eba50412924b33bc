use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::Instrument;

use crate::{Content, Key, KeyLocks, Storage, StorageError, StorageResult};

/// Storage backend rooted at a directory on the local filesystem.
///
/// Keys map to relative paths under the root. Saves are written to a
/// temporary file in the root and published with an atomic rename, so a
/// concurrent reader sees either the previous value or the complete new
/// one. The filesystem forbids a key from being both a value and a
/// directory of children.
#[derive(Debug)]
pub struct LocalStorage {
    root: Utf8PathBuf,
    locks: KeyLocks,
}

impl LocalStorage {
    /// Create a storage rooted at `root`. The directory is created on
    /// first save; it does not need to exist yet.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: KeyLocks::new(),
        }
    }

    fn path(&self, key: &Key) -> StorageResult<Utf8PathBuf> {
        if key.is_root() {
            return Err(StorageError::InvalidKey {
                key: key.clone(),
                reason: "the root key cannot hold a value".into(),
            });
        }
        if key
            .segments()
            .iter()
            .any(|s| s == "." || s == ".." || s.contains('\0'))
        {
            return Err(StorageError::InvalidKey {
                key: key.clone(),
                reason: "key segments may not traverse the root".into(),
            });
        }
        let mut path = self.root.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        Ok(path)
    }
}

fn map_io(key: &Key, err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::not_found(key),
        _ => StorageError::io(key, err),
    }
}

#[async_trait::async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, key: &Key) -> StorageResult<bool> {
        let path = self.path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::io(key, err)),
        }
    }

    #[tracing::instrument(skip(self), fields(root = %self.root))]
    async fn value(&self, key: &Key) -> StorageResult<Content> {
        let path = self.path(key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|err| map_io(key, err))?;
        let size = file
            .metadata()
            .await
            .map_err(|err| StorageError::io(key, err))?
            .len();
        // The file handle lives inside the stream; abandoning the content
        // closes it.
        Ok(Content::from_stream(ReaderStream::new(file), Some(size)))
    }

    #[tracing::instrument(skip(self, content), fields(root = %self.root, size = content.size()))]
    async fn save(&self, key: &Key, content: Content) -> StorageResult<()> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::io(key, err))?;
        }

        let tmp = tempfile::Builder::new()
            .prefix(".incoming-")
            .tempfile_in(&self.root)
            .map_err(|err| StorageError::io(key, err))?
            .into_temp_path();

        let mut file = tokio::io::BufWriter::new(
            tokio::fs::File::create(&tmp)
                .await
                .map_err(|err| StorageError::io(key, err))?,
        );
        let mut chunks = content.into_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| StorageError::io(key, err))?;
            file.write_all(&chunk)
                .await
                .map_err(|err| StorageError::io(key, err))?;
        }
        file.shutdown()
            .await
            .map_err(|err| StorageError::io(key, err))?;

        // Same filesystem as the destination, so persist is one rename.
        tmp.persist(&path)
            .map_err(|err| StorageError::io(key, err.error))?;
        tracing::trace!(%key, "saved");
        Ok(())
    }

    async fn rename(&self, src: &Key, dst: &Key) -> StorageResult<()> {
        let from = self.path(src)?;
        let to = self.path(dst)?;
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::io(dst, err))?;
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|err| map_io(src, err))
    }

    async fn delete(&self, key: &Key) -> StorageResult<()> {
        let path = self.path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|err| map_io(key, err))
    }

    #[tracing::instrument(skip(self), fields(root = %self.root))]
    async fn list(&self, prefix: &Key) -> StorageResult<Vec<Key>> {
        let root = self.root.clone();
        let prefix = prefix.clone();
        let keys = tokio::task::spawn_blocking(move || collect_keys(&root, &prefix))
            .in_current_span()
            .await
            .map_err(|err| StorageError::io(&Key::root(), io::Error::other(err)))??;
        tracing::debug!("found {} keys", keys.len());
        Ok(keys)
    }

    fn locks(&self) -> &KeyLocks {
        &self.locks
    }
}

fn collect_keys(root: &Utf8Path, prefix: &Key) -> StorageResult<Vec<Key>> {
    let mut files = Vec::new();
    if root.is_dir() {
        visit(root, &mut files).map_err(|err| StorageError::io(prefix, err))?;
    }

    let mut keys: Vec<Key> = files
        .into_iter()
        .filter_map(|path| path.strip_prefix(root).ok().map(Key::from))
        .filter(|key| key.starts_with(prefix))
        .collect();
    keys.sort();
    Ok(keys)
}

fn visit(path: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> io::Result<()> {
    for entry in path.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            visit(entry.path(), files)?;
        } else if !entry.file_name().starts_with(".incoming-") {
            files.push(entry.path().to_owned());
        }
    }
    Ok(())
}

impl From<Utf8PathBuf> for Key {
    fn from(path: Utf8PathBuf) -> Self {
        Key::from(path.as_str())
    }
}

impl From<&Utf8Path> for Key {
    fn from(path: &Utf8Path) -> Self {
        Key::from(path.as_str())
    }
}
