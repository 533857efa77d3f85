use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milestone definition as it appears in a catalog template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTemplate {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A trackable milestone inside a user's path.
///
/// Completion is stored only as the completion timestamp, so a milestone is
/// completed exactly when `completed_at` is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    title: String,
    description: String,
    badge: String,
    skills: Vec<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl Milestone {
    /// Copy a template milestone into a fresh, incomplete milestone.
    #[must_use]
    pub fn from_template(template: &MilestoneTemplate) -> Self {
        Self {
            title: template.title.clone(),
            description: template.description.clone(),
            badge: template.badge.clone(),
            skills: template.skills.clone(),
            completed_at: None,
        }
    }

    #[must_use]
    pub fn from_persisted(
        title: String,
        description: String,
        badge: String,
        skills: Vec<String>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            title,
            description,
            badge,
            skills,
            completed_at,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Badge awarded on completion; empty when the milestone awards none.
    #[must_use]
    pub fn badge(&self) -> &str {
        &self.badge
    }

    #[must_use]
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Flip completion: stamps `now` when completing, clears the stamp otherwise.
    #[must_use]
    pub fn toggled(&self, now: DateTime<Utc>) -> Self {
        let completed_at = match self.completed_at {
            Some(_) => None,
            None => Some(now),
        };
        Self {
            completed_at,
            ..self.clone()
        }
    }
}

/// Wire shape of a milestone as sent by clients and stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MilestoneRecord {
    /// Normalize into a domain milestone.
    ///
    /// An incomplete record drops any stray `completedAt`; a completed record
    /// without one is stamped with `now`.
    #[must_use]
    pub fn into_milestone(self, now: DateTime<Utc>) -> Milestone {
        let completed_at = if self.completed {
            Some(self.completed_at.unwrap_or(now))
        } else {
            None
        };
        Milestone {
            title: self.title,
            description: self.description,
            badge: self.badge.unwrap_or_default(),
            skills: self.skills,
            completed_at,
        }
    }
}

impl From<&Milestone> for MilestoneRecord {
    fn from(m: &Milestone) -> Self {
        Self {
            title: m.title.clone(),
            description: m.description.clone(),
            badge: Some(m.badge.clone()),
            skills: m.skills.clone(),
            completed: m.completed(),
            completed_at: m.completed_at,
        }
    }
}
