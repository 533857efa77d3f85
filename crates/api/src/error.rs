use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pathway_core::model::PathError;
use serde_json::json;
use services::{ChatRelayError, ProgressSyncError};
use storage::repository::StorageError;

/// Handler error rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Storage failures are logged and reported without detail.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Assistant failures carry their message through to the client.
    #[error(transparent)]
    Assistant(#[from] ChatRelayError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ProgressSyncError> for AppError {
    fn from(e: ProgressSyncError) -> Self {
        match e {
            ProgressSyncError::Path(
                err @ (PathError::DuplicatePath { .. } | PathError::DuplicateId(_)),
            ) => Self::Conflict(err.to_string()),
            ProgressSyncError::Path(err) => Self::BadRequest(err.to_string()),
            ProgressSyncError::Storage(StorageError::Conflict(msg)) => Self::Conflict(msg),
            ProgressSyncError::Storage(err) => Self::Storage(err),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Storage(StorageError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Assistant(err) => {
                tracing::error!(error = %err, "assistant error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
