use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates users, learning paths and their ordered milestones.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS learning_paths (
                    user_id TEXT NOT NULL,
                    id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    title TEXT NOT NULL,
                    category TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, id),
                    UNIQUE (user_id, category),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // completed and completed_at must agree.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS milestones (
                    user_id TEXT NOT NULL,
                    path_id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    badge TEXT,
                    skills TEXT NOT NULL DEFAULT '[]',
                    completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
                    completed_at TEXT,
                    CHECK ((completed = 1) = (completed_at IS NOT NULL)),
                    PRIMARY KEY (user_id, path_id, position),
                    FOREIGN KEY (user_id, path_id)
                        REFERENCES learning_paths(user_id, id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_learning_paths_user_position
                    ON learning_paths (user_id, position);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
