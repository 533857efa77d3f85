use std::sync::Arc;

use pathway_core::Clock;
use pathway_core::model::{OwnerKey, PathSet, UserPath, UserPathRecord};
use storage::repository::ProgressStore;

use crate::error::ProgressSyncError;

/// Server-side load and wholesale replace of an owner's paths.
#[derive(Clone)]
pub struct ProgressSyncService {
    clock: Clock,
    store: Arc<dyn ProgressStore>,
}

impl ProgressSyncService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn ProgressStore>) -> Self {
        Self { clock, store }
    }

    /// Paths stored for `owner`, in saved order; empty when none exist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressSyncError::Storage` if the store cannot be read.
    pub async fn fetch(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, ProgressSyncError> {
        Ok(self.store.load(owner).await?)
    }

    /// Normalize client records and replace everything stored for `owner`.
    ///
    /// The owner record is created on first write.
    ///
    /// # Errors
    ///
    /// Returns `ProgressSyncError::Path` for blank fields or repeated categories.
    /// Returns `ProgressSyncError::Storage` if the write fails; prior state is kept.
    pub async fn replace(
        &self,
        owner: &OwnerKey,
        records: Vec<UserPathRecord>,
    ) -> Result<Vec<UserPath>, ProgressSyncError> {
        let now = self.clock.now();
        let paths = records
            .into_iter()
            .map(|r| r.into_path(now))
            .collect::<Result<Vec<_>, _>>()?;
        let set = PathSet::from_paths(paths)?;

        self.store.ensure_owner(owner).await?;
        self.store.replace_all(owner, set.paths()).await?;
        tracing::debug!(owner = %owner, paths = set.len(), "learning paths replaced");
        Ok(set.into_paths())
    }
}
