//! Device-local fallback store: one JSON entry per owner key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use pathway_core::Clock;
use pathway_core::model::{OwnerKey, UserPath, UserPathRecord, UserPathView};

use crate::repository::{ProgressStore, StorageError};

/// Name of the single keyed entry holding an owner's serialized paths.
pub const LOCAL_ENTRY_NAME: &str = "learningPaths";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn io_err(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

/// Stores each owner's paths as a JSON array under `root`.
///
/// Writes land in a temp file that is renamed over the entry, so a failed
/// write never leaves a partial array behind.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    clock: Clock,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `owner`'s entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` for keys that are not plain file-name safe.
    pub fn entry_path(&self, owner: &OwnerKey) -> Result<PathBuf, StorageError> {
        let key = owner.as_str();
        let safe = !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{LOCAL_ENTRY_NAME}.json")))
    }
}

#[async_trait]
impl ProgressStore for LocalStore {
    async fn load(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, StorageError> {
        let path = self.entry_path(owner)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let now = self.clock.now();
        let parsed = serde_json::from_slice::<Vec<UserPathRecord>>(&bytes)
            .map_err(ser)
            .and_then(|records| {
                records
                    .into_iter()
                    .map(|r| r.into_path(now).map_err(ser))
                    .collect::<Result<Vec<_>, _>>()
            });

        match parsed {
            Ok(paths) => Ok(paths),
            Err(e) => {
                tracing::warn!(
                    owner = %owner,
                    file = %path.display(),
                    error = %e,
                    "unreadable local entry, starting from an empty set"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn replace_all(&self, owner: &OwnerKey, paths: &[UserPath]) -> Result<(), StorageError> {
        let target = self.entry_path(owner)?;
        let views: Vec<UserPathView> = paths.iter().map(UserPathView::from).collect();
        let body = serde_json::to_vec(&views).map_err(ser)?;

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;

        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }

        tracing::debug!(owner = %owner, paths = paths.len(), "wrote local entry");
        Ok(())
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}
