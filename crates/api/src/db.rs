//! `SQLite` URL handling for the server binary.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DbUrlError {
    #[error("invalid DATABASE_URL value: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn is_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

/// Turn `foo.db`, `sqlite:foo.db` or `sqlite://foo.db` into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_memory(trimmed) {
        return trimmed.to_string();
    }

    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directory so the pool can open it.
///
/// # Errors
///
/// Returns `DbUrlError` for URLs without a path or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), DbUrlError> {
    if is_memory(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| DbUrlError::Invalid(db_url.to_string()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(DbUrlError::Invalid(db_url.to_string()));
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        tracing::info!(file = %path.display(), "created database file");
    }
    Ok(())
}
