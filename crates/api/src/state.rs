use std::sync::Arc;

use services::AppServices;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub config: Arc<ServerConfig>,
}
