use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{IdError, PathId};
use crate::model::milestone::{Milestone, MilestoneRecord, MilestoneTemplate};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    #[error("path title cannot be empty")]
    EmptyTitle,

    #[error("path category cannot be empty")]
    EmptyCategory,

    #[error("milestone index {index} out of range for path with {len} milestones")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("learning path already added: {category}")]
    DuplicatePath { category: String },

    #[error("duplicate learning path id: {0}")]
    DuplicateId(PathId),

    #[error("learning path not found: {0}")]
    PathNotFound(PathId),

    #[error(transparent)]
    InvalidId(#[from] IdError),
}

//
// ─── TEMPLATE ──────────────────────────────────────────────────────────────────
//

/// Read-only catalog entry a user path is instantiated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTemplate {
    pub category: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "color")]
    pub color_tag: String,
    pub milestones: Vec<MilestoneTemplate>,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Derived completion figures; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl PathProgress {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

//
// ─── USER PATH ─────────────────────────────────────────────────────────────────
//

/// A learning path chosen by one owner, with its own copy of the milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPath {
    id: PathId,
    title: String,
    category: String,
    created_at: DateTime<Utc>,
    milestones: Vec<Milestone>,
}

impl UserPath {
    /// Instantiate a path from a catalog template.
    ///
    /// Milestones are copied by value, so later catalog edits never reach
    /// already-created paths.
    #[must_use]
    pub fn from_template(template: &PathTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id: PathId::generate(&template.category, now),
            title: format!("{} {} Path", template.icon, template.category),
            category: template.category.clone(),
            created_at: now,
            milestones: template
                .milestones
                .iter()
                .map(Milestone::from_template)
                .collect(),
        }
    }

    /// Rehydrate a path from storage or client input.
    ///
    /// # Errors
    ///
    /// Returns `PathError::EmptyTitle` or `PathError::EmptyCategory` for blank fields.
    pub fn from_persisted(
        id: PathId,
        title: String,
        category: String,
        created_at: DateTime<Utc>,
        milestones: Vec<Milestone>,
    ) -> Result<Self, PathError> {
        if title.trim().is_empty() {
            return Err(PathError::EmptyTitle);
        }
        if category.trim().is_empty() {
            return Err(PathError::EmptyCategory);
        }
        Ok(Self {
            id,
            title,
            category,
            created_at,
            milestones,
        })
    }

    #[must_use]
    pub fn id(&self) -> &PathId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    #[must_use]
    pub fn progress(&self) -> PathProgress {
        let completed = self.milestones.iter().filter(|m| m.completed()).count();
        PathProgress::new(completed, self.milestones.len())
    }

    /// Return a copy with milestone `index` flipped.
    ///
    /// # Errors
    ///
    /// Returns `PathError::IndexOutOfRange` if `index` is not a milestone position.
    pub fn toggle_milestone(&self, index: usize, now: DateTime<Utc>) -> Result<Self, PathError> {
        let Some(current) = self.milestones.get(index) else {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.milestones.len(),
            });
        };
        let mut updated = self.clone();
        updated.milestones[index] = current.toggled(now);
        Ok(updated)
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

/// Path as accepted from clients and local storage.
///
/// Derived fields (`progress`, `completed`, `total`) may be present in the
/// JSON; they are ignored and recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPathRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub milestones: Vec<MilestoneRecord>,
}

impl UserPathRecord {
    /// Normalize into a domain path, filling a missing id or creation time from `now`.
    ///
    /// # Errors
    ///
    /// Returns `PathError` if the title, category, or supplied id is blank.
    pub fn into_path(self, now: DateTime<Utc>) -> Result<UserPath, PathError> {
        let id = match self.id {
            Some(raw) => PathId::new(raw)?,
            None => PathId::generate(&self.category, now),
        };
        let milestones = self
            .milestones
            .into_iter()
            .map(|m| m.into_milestone(now))
            .collect();
        UserPath::from_persisted(
            id,
            self.title,
            self.category,
            self.created_at.unwrap_or(now),
            milestones,
        )
    }
}

/// Path as returned to clients and written to local storage, with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPathView {
    pub id: PathId,
    pub title: String,
    pub category: String,
    pub milestones: Vec<MilestoneRecord>,
    pub progress: f64,
    pub completed: usize,
    pub total: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&UserPath> for UserPathView {
    fn from(path: &UserPath) -> Self {
        let progress = path.progress();
        Self {
            id: path.id.clone(),
            title: path.title.clone(),
            category: path.category.clone(),
            milestones: path.milestones.iter().map(MilestoneRecord::from).collect(),
            progress: progress.percent,
            completed: progress.completed,
            total: progress.total,
            created_at: path.created_at,
        }
    }
}
