use chrono::{DateTime, Utc};

use crate::model::ids::PathId;
use crate::model::path::{PathError, PathProgress, PathTemplate, UserPath};

/// An owner's ordered collection of learning paths.
///
/// Categories and ids are unique within a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    paths: Vec<UserPath>,
}

impl PathSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from already-instantiated paths, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `PathError::DuplicatePath` if two paths share a category and
    /// `PathError::DuplicateId` if two paths share an id.
    pub fn from_paths(paths: Vec<UserPath>) -> Result<Self, PathError> {
        for (i, path) in paths.iter().enumerate() {
            let earlier = &paths[..i];
            if earlier.iter().any(|p| p.id() == path.id()) {
                return Err(PathError::DuplicateId(path.id().clone()));
            }
            if earlier.iter().any(|p| p.category() == path.category()) {
                return Err(PathError::DuplicatePath {
                    category: path.category().to_string(),
                });
            }
        }
        Ok(Self { paths })
    }

    #[must_use]
    pub fn paths(&self) -> &[UserPath] {
        &self.paths
    }

    #[must_use]
    pub fn into_paths(self) -> Vec<UserPath> {
        self.paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// True when there is nothing to track yet and the catalog should be offered.
    #[must_use]
    pub fn needs_selection(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn contains_category(&self, category: &str) -> bool {
        self.paths.iter().any(|p| p.category() == category)
    }

    #[must_use]
    pub fn get(&self, id: &PathId) -> Option<&UserPath> {
        self.paths.iter().find(|p| p.id() == id)
    }

    /// Instantiate `template` and append it.
    ///
    /// # Errors
    ///
    /// Returns `PathError::DuplicatePath` if the category is already present;
    /// the set is left unchanged.
    pub fn add_template(
        &mut self,
        template: &PathTemplate,
        now: DateTime<Utc>,
    ) -> Result<&UserPath, PathError> {
        if self.contains_category(&template.category) {
            return Err(PathError::DuplicatePath {
                category: template.category.clone(),
            });
        }
        self.paths.push(UserPath::from_template(template, now));
        let last = self.paths.len() - 1;
        Ok(&self.paths[last])
    }

    /// Remove the path with `id`.
    ///
    /// # Errors
    ///
    /// Returns `PathError::PathNotFound` if no such path exists.
    pub fn remove(&mut self, id: &PathId) -> Result<UserPath, PathError> {
        let pos = self
            .position(id)
            .ok_or_else(|| PathError::PathNotFound(id.clone()))?;
        Ok(self.paths.remove(pos))
    }

    /// Flip one milestone of the path with `id`.
    ///
    /// # Errors
    ///
    /// Returns `PathError::PathNotFound` or `PathError::IndexOutOfRange`; the
    /// set is unchanged on error.
    pub fn toggle_milestone(
        &mut self,
        id: &PathId,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<&UserPath, PathError> {
        let pos = self
            .position(id)
            .ok_or_else(|| PathError::PathNotFound(id.clone()))?;
        let updated = self.paths[pos].toggle_milestone(index, now)?;
        self.paths[pos] = updated;
        Ok(&self.paths[pos])
    }

    #[must_use]
    pub fn overall_progress(&self) -> PathProgress {
        overall_progress(&self.paths)
    }

    fn position(&self, id: &PathId) -> Option<usize> {
        self.paths.iter().position(|p| p.id() == id)
    }
}

/// Completed milestones over all milestones, across every path.
#[must_use]
pub fn overall_progress(paths: &[UserPath]) -> PathProgress {
    let (completed, total) = paths.iter().fold((0, 0), |(done, all), path| {
        let p = path.progress();
        (done + p.completed, all + p.total)
    });
    PathProgress::new(completed, total)
}
