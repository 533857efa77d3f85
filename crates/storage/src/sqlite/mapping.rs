use chrono::{DateTime, Utc};
use pathway_core::model::{Milestone, PathId, UserPath};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classify a sqlx error; unique-key clashes become `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Conflict(db.message().to_string())
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn position_to_i64(pos: usize) -> Result<i64, StorageError> {
    i64::try_from(pos).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn skills_to_json(skills: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(skills).map_err(ser)
}

/// Empty badges are stored as NULL.
pub(crate) fn badge_to_column(badge: &str) -> Option<&str> {
    if badge.is_empty() { None } else { Some(badge) }
}

pub(crate) fn map_milestone_row(row: &SqliteRow) -> Result<Milestone, StorageError> {
    let completed: i64 = row.try_get("completed").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;
    if (completed == 1) != completed_at.is_some() {
        return Err(StorageError::Serialization(
            "completed flag disagrees with completed_at".into(),
        ));
    }

    let skills_json: String = row.try_get("skills").map_err(ser)?;
    let skills: Vec<String> = serde_json::from_str(&skills_json).map_err(ser)?;

    Ok(Milestone::from_persisted(
        row.try_get("title").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        row.try_get::<Option<String>, _>("badge")
            .map_err(ser)?
            .unwrap_or_default(),
        skills,
        completed_at,
    ))
}

pub(crate) fn map_path_row(
    row: &SqliteRow,
    milestones: Vec<Milestone>,
) -> Result<UserPath, StorageError> {
    let id = PathId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    UserPath::from_persisted(
        id,
        row.try_get("title").map_err(ser)?,
        row.try_get("category").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        milestones,
    )
    .map_err(ser)
}
