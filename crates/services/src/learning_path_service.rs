use std::sync::Arc;

use pathway_core::model::{PathId, PathProgress, PathSet, UserPath};
use pathway_core::{Catalog, Clock};
use storage::{Identity, StoreBackend, StoreSelector};

use crate::error::LearningPathError;

/// What the dashboard renders after every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub paths: Vec<UserPath>,
    pub overall_progress: PathProgress,
    /// True when the owner has no paths and should be offered the catalog.
    pub show_selection: bool,
    pub backend: StoreBackend,
}

impl DashboardSnapshot {
    fn new(set: PathSet, backend: StoreBackend) -> Self {
        Self {
            overall_progress: set.overall_progress(),
            show_selection: set.needs_selection(),
            paths: set.into_paths(),
            backend,
        }
    }
}

/// Dashboard flow: pick templates, toggle milestones, persist the whole set.
///
/// Every mutation loads the current set, applies the change in memory and
/// saves the full set back through the selector.
#[derive(Clone)]
pub struct LearningPathService {
    clock: Clock,
    catalog: Arc<Catalog>,
    selector: Arc<StoreSelector>,
    identity: Identity,
}

impl LearningPathService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<Catalog>,
        selector: Arc<StoreSelector>,
        identity: Identity,
    ) -> Self {
        Self {
            clock,
            catalog,
            selector,
            identity,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn active_backend(&self) -> StoreBackend {
        self.selector.active_backend()
    }

    async fn load_set(&self) -> Result<(PathSet, StoreBackend), LearningPathError> {
        let loaded = self.selector.load(&self.identity).await?;
        Ok((PathSet::from_paths(loaded.paths)?, loaded.backend))
    }

    async fn save_set(&self, set: PathSet) -> Result<DashboardSnapshot, LearningPathError> {
        let backend = self.selector.save(&self.identity, set.paths()).await?;
        Ok(DashboardSnapshot::new(set, backend))
    }

    /// Current paths and derived progress.
    ///
    /// # Errors
    ///
    /// Returns `LearningPathError::Storage` if no backend can be read.
    /// Returns `LearningPathError::Path` if stored data repeats a category.
    pub async fn snapshot(&self) -> Result<DashboardSnapshot, LearningPathError> {
        let (set, backend) = self.load_set().await?;
        Ok(DashboardSnapshot::new(set, backend))
    }

    /// Instantiate the catalog template for `category` and persist it.
    ///
    /// # Errors
    ///
    /// Returns `LearningPathError::UnknownCategory` if the catalog has no such template.
    /// Returns `LearningPathError::Path` with `DuplicatePath` if the category is already chosen.
    /// Returns `LearningPathError::Storage` if persistence fails on every backend.
    pub async fn add_path(&self, category: &str) -> Result<DashboardSnapshot, LearningPathError> {
        let template = self
            .catalog
            .find_template(category)
            .ok_or_else(|| LearningPathError::UnknownCategory(category.to_string()))?;

        let (mut set, _) = self.load_set().await?;
        set.add_template(template, self.clock.now())?;
        tracing::info!(category, "learning path added");
        self.save_set(set).await
    }

    /// Remove one path by id.
    ///
    /// # Errors
    ///
    /// Returns `LearningPathError::Path` with `PathNotFound` if the id is unknown.
    /// Returns `LearningPathError::Storage` if persistence fails on every backend.
    pub async fn remove_path(&self, id: &PathId) -> Result<DashboardSnapshot, LearningPathError> {
        let (mut set, _) = self.load_set().await?;
        let removed = set.remove(id)?;
        tracing::info!(category = removed.category(), "learning path removed");
        self.save_set(set).await
    }

    /// Flip one milestone's completion.
    ///
    /// # Errors
    ///
    /// Returns `LearningPathError::Path` for unknown ids or out-of-range indexes.
    /// Returns `LearningPathError::Storage` if persistence fails on every backend.
    pub async fn toggle_milestone(
        &self,
        id: &PathId,
        index: usize,
    ) -> Result<DashboardSnapshot, LearningPathError> {
        let (mut set, _) = self.load_set().await?;
        set.toggle_milestone(id, index, self.clock.now())?;
        self.save_set(set).await
    }
}
