use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pathway_core::model::{Milestone, OwnerKey, UserPath};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    badge_to_column, db_err, map_milestone_row, map_path_row, position_to_i64, ser,
    skills_to_json,
};
use crate::repository::{ProgressStore, StorageError};

/// Domain used for the contact field of implicitly created users.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "placeholder.invalid";

#[async_trait]
impl ProgressStore for SqliteRepository {
    async fn ensure_owner(&self, owner: &OwnerKey) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (id, email, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(owner.as_str())
        .bind(format!("{owner}@{PLACEHOLDER_EMAIL_DOMAIN}"))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() > 0 {
            tracing::info!(owner = %owner, "created user record on first write");
        }
        Ok(())
    }

    async fn load(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, StorageError> {
        // One read transaction so a concurrent replace is seen entirely or not at all.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let path_rows = sqlx::query(
            r"
            SELECT id, title, category, created_at
            FROM learning_paths
            WHERE user_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        if path_rows.is_empty() {
            return Ok(Vec::new());
        }

        let milestone_rows = sqlx::query(
            r"
            SELECT path_id, title, description, badge, skills, completed, completed_at
            FROM milestones
            WHERE user_id = ?1
            ORDER BY path_id ASC, position ASC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let mut by_path: HashMap<String, Vec<Milestone>> = HashMap::new();
        for row in &milestone_rows {
            let path_id: String = row.try_get("path_id").map_err(ser)?;
            by_path
                .entry(path_id)
                .or_default()
                .push(map_milestone_row(row)?);
        }

        let mut paths = Vec::with_capacity(path_rows.len());
        for row in &path_rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let milestones = by_path.remove(&id).unwrap_or_default();
            paths.push(map_path_row(row, milestones)?);
        }
        Ok(paths)
    }

    async fn replace_all(&self, owner: &OwnerKey, paths: &[UserPath]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Delete first so the transaction takes the write lock up front.
        let removed = sqlx::query("DELETE FROM learning_paths WHERE user_id = ?1")
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let known = sqlx::query("SELECT 1 FROM users WHERE id = ?1")
            .bind(owner.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .is_some();
        if !known {
            return Err(StorageError::NotFound);
        }

        for (position, path) in paths.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO learning_paths (user_id, id, position, title, category, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(owner.as_str())
            .bind(path.id().as_str())
            .bind(position_to_i64(position)?)
            .bind(path.title())
            .bind(path.category())
            .bind(path.created_at())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            for (m_position, milestone) in path.milestones().iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO milestones (
                        user_id, path_id, position, title, description, badge,
                        skills, completed, completed_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ",
                )
                .bind(owner.as_str())
                .bind(path.id().as_str())
                .bind(position_to_i64(m_position)?)
                .bind(milestone.title())
                .bind(milestone.description())
                .bind(badge_to_column(milestone.badge()))
                .bind(skills_to_json(milestone.skills())?)
                .bind(i64::from(milestone.completed()))
                .bind(milestone.completed_at())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(
            owner = %owner,
            removed,
            inserted = paths.len(),
            "replaced learning paths"
        );
        Ok(())
    }
}
