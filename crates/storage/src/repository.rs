use async_trait::async_trait;
use pathway_core::model::{OwnerKey, UserPath};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("invalid owner key for this backend: {0}")]
    InvalidKey(String),
}

/// Persistence contract for an owner's learning paths.
///
/// `replace_all` swaps the whole set for an owner: it never merges, and on
/// failure the previously stored set stays visible to `load`.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Make sure an owner record exists before the first write.
    ///
    /// Backends without owner records accept any key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the owner cannot be created.
    async fn ensure_owner(&self, _owner: &OwnerKey) -> Result<(), StorageError> {
        Ok(())
    }

    /// Load the owner's paths in stored order; an unknown owner yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, StorageError>;

    /// Atomically replace the owner's entire path set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; prior state is retained.
    async fn replace_all(&self, owner: &OwnerKey, paths: &[UserPath]) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
///
/// Mirrors the database backend: writes require `ensure_owner` first.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    owners: Arc<Mutex<HashSet<OwnerKey>>>,
    paths: Arc<Mutex<HashMap<OwnerKey, Vec<UserPath>>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageError::Connection` until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn ensure_owner(&self, owner: &OwnerKey) -> Result<(), StorageError> {
        self.check_available()?;
        let mut guard = self
            .owners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(owner.clone());
        Ok(())
    }

    async fn load(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, StorageError> {
        self.check_available()?;
        let guard = self
            .paths
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(owner).cloned().unwrap_or_default())
    }

    async fn replace_all(&self, owner: &OwnerKey, paths: &[UserPath]) -> Result<(), StorageError> {
        self.check_available()?;
        let known = self
            .owners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .contains(owner);
        if !known {
            return Err(StorageError::NotFound);
        }
        let mut guard = self
            .paths
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(owner.clone(), paths.to_vec());
        Ok(())
    }
}
