use axum::Json;
use axum::extract::State;
use pathway_core::model::PathTemplate;

use crate::state::AppState;

/// GET /catalog -- every template, in catalog order.
pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<PathTemplate>> {
    Json(state.services.catalog().list_templates().to_vec())
}
