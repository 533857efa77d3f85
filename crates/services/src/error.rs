//! Shared error types for the services crate.

use thiserror::Error;

use pathway_core::CatalogError;
use pathway_core::model::PathError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ChatRelay` and assistant clients.
///
/// Display strings double as the user-facing error text of the assistant endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatRelayError {
    #[error("Missing OPENAI_API_KEY. See README for setup.")]
    MissingCredential,
    #[error("Upstream error: {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0}")]
    Internal(String),
}

impl From<reqwest::Error> for ChatRelayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Errors emitted by `LearningPathService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningPathError {
    #[error("no catalog template for category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressSyncService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressSyncError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to read catalog file: {0}")]
    CatalogFile(#[from] std::io::Error),
}
