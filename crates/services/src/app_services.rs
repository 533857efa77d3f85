use std::path::Path;
use std::sync::Arc;

use pathway_core::Catalog;
use storage::repository::{InMemoryRepository, ProgressStore};
use storage::sqlite::SqliteRepository;

use crate::Clock;
use crate::chat_relay::ChatRelay;
use crate::error::AppServicesError;
use crate::progress_sync_service::ProgressSyncService;

/// Server-side service graph: catalog, progress sync and chat relay.
///
/// Holds the database handle so it can be closed at shutdown.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress_sync: Arc<ProgressSyncService>,
    chat_relay: Arc<ChatRelay>,
    database: Option<SqliteRepository>,
}

/// Use the catalog file at `path` when given, otherwise the built-in one.
///
/// # Errors
///
/// Returns `AppServicesError` if the file cannot be read or is not a valid catalog.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, AppServicesError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let catalog = Catalog::from_json(&raw)?;
            tracing::info!(
                file = %path.display(),
                templates = catalog.list_templates().len(),
                "loaded catalog file"
            );
            Ok(catalog)
        }
        None => Ok(Catalog::builtin()?),
    }
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Catalog,
        chat_relay: ChatRelay,
    ) -> Result<Self, AppServicesError> {
        let repo = SqliteRepository::connect(db_url).await?;
        repo.migrate().await?;
        let store: Arc<dyn ProgressStore> = Arc::new(repo.clone());
        Ok(Self::assemble(clock, catalog, chat_relay, store, Some(repo)))
    }

    /// Build services over an in-memory store; nothing survives the process.
    #[must_use]
    pub fn in_memory(clock: Clock, catalog: Catalog, chat_relay: ChatRelay) -> Self {
        Self::assemble(
            clock,
            catalog,
            chat_relay,
            Arc::new(InMemoryRepository::new()),
            None,
        )
    }

    fn assemble(
        clock: Clock,
        catalog: Catalog,
        chat_relay: ChatRelay,
        store: Arc<dyn ProgressStore>,
        database: Option<SqliteRepository>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            progress_sync: Arc::new(ProgressSyncService::new(clock, store)),
            chat_relay: Arc::new(chat_relay),
            database,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress_sync(&self) -> Arc<ProgressSyncService> {
        Arc::clone(&self.progress_sync)
    }

    #[must_use]
    pub fn chat_relay(&self) -> Arc<ChatRelay> {
        Arc::clone(&self.chat_relay)
    }

    /// Close the database pool, if any.
    pub async fn shutdown(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}
