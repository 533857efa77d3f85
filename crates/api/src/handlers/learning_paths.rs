use axum::Json;
use axum::extract::{Query, State};
use pathway_core::model::{UserPathRecord, UserPathView};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePathsRequest {
    pub user_id: Option<String>,
    pub paths: Vec<UserPathRecord>,
}

#[derive(Debug, Serialize)]
pub struct ReplacePathsResponse {
    pub success: bool,
    pub paths: Vec<UserPathView>,
}

/// GET /learning-paths?userId=<id>
pub async fn list_paths(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PathsQuery>,
) -> AppResult<Json<Vec<UserPathView>>> {
    let owner = user.require_owner(query.user_id.as_deref())?;
    let paths = state.services.progress_sync().fetch(owner).await?;
    Ok(Json(paths.iter().map(UserPathView::from).collect()))
}

/// POST /learning-paths -- replaces the caller's whole set.
pub async fn replace_paths(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ReplacePathsRequest>,
) -> AppResult<Json<ReplacePathsResponse>> {
    let owner = user.require_owner(body.user_id.as_deref())?;
    let stored = state
        .services
        .progress_sync()
        .replace(owner, body.paths)
        .await?;
    tracing::info!(owner = %owner, paths = stored.len(), "learning paths saved");
    Ok(Json(ReplacePathsResponse {
        success: true,
        paths: stored.iter().map(UserPathView::from).collect(),
    }))
}
