use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::{LocalStorage, MemoryStorage, Storage};

/// Declarative selection of a storage backend.
///
/// Deserialized from repository configuration, e.g.
///
/// ```yaml
/// storage:
///   local:
///     path: /var/lib/depot
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageConfig {
    /// Keep everything in memory.
    Memory,

    /// Store under a directory on the local filesystem.
    Local {
        /// Root directory for stored values.
        path: Utf8PathBuf,
    },
}

impl StorageConfig {
    /// Build the configured backend.
    #[tracing::instrument]
    pub fn build(self) -> Arc<dyn Storage> {
        match self {
            StorageConfig::Memory => Arc::new(MemoryStorage::new()),
            StorageConfig::Local { path } => Arc::new(LocalStorage::new(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct RepoConfig {
        storage: StorageConfig,
    }

    #[test]
    fn deserializes_backend_variants() {
        let config: RepoConfig =
            serde_json::from_str(r#"{"storage": {"local": {"path": "/var/lib/depot"}}}"#).unwrap();
        assert!(matches!(
            config.storage,
            StorageConfig::Local { ref path } if path == "/var/lib/depot"
        ));

        let config: RepoConfig = serde_json::from_str(r#"{"storage": "memory"}"#).unwrap();
        assert!(matches!(config.storage, StorageConfig::Memory));
    }
}
