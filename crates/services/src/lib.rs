#![forbid(unsafe_code)]

pub mod app_services;
pub mod chat_relay;
pub mod conversation;
pub mod error;
pub mod learning_path_service;
pub mod progress_sync_service;
pub mod remote;

pub use pathway_core::Clock;

pub use app_services::{AppServices, load_catalog};
pub use chat_relay::{ChatMessage, ChatRelay, DeploymentMode, ProviderConfig, Role};
pub use conversation::{Assistant, Conversation, HISTORY_WINDOW};
pub use error::{AppServicesError, ChatRelayError, LearningPathError, ProgressSyncError};
pub use learning_path_service::{DashboardSnapshot, LearningPathService};
pub use progress_sync_service::ProgressSyncService;
pub use remote::{HttpAssistant, HttpProgressStore};
