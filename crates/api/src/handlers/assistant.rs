use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use services::ChatMessage;

use crate::error::AppResult;
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantReply {
    pub reply: String,
}

/// POST /assistant-chat
///
/// The relay sends the history as given; clients window it.
pub async fn assistant_chat(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AssistantRequest>,
) -> AppResult<Json<AssistantReply>> {
    tracing::debug!(
        messages = body.messages.len(),
        skill = body.skill.as_deref().unwrap_or(""),
        "assistant request"
    );
    let reply = state
        .services
        .chat_relay()
        .respond(&body.messages, body.skill.as_deref(), body.level.as_deref())
        .await?;
    Ok(Json(AssistantReply { reply }))
}
