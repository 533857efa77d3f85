//! HTTP clients for a running Pathway API: the remote progress backend and
//! the assistant endpoint.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use pathway_core::Clock;
use pathway_core::model::{OwnerKey, UserPath, UserPathRecord, UserPathView};
use storage::repository::{ProgressStore, StorageError};

use crate::chat_relay::ChatMessage;
use crate::conversation::Assistant;
use crate::error::ChatRelayError;

fn endpoint(base_url: &str, path: &str) -> Result<Url, String> {
    let raw = format!("{}/{path}", base_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| format!("invalid API url {raw}: {e}"))
}

fn conn<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// `ProgressStore` backed by `GET`/`POST /learning-paths` with a bearer token.
///
/// The server creates owner records itself, so `ensure_owner` stays a no-op.
#[derive(Clone)]
pub struct HttpProgressStore {
    client: Client,
    base_url: String,
    token: String,
    clock: Clock,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceRequest<'a> {
    user_id: &'a str,
    paths: Vec<UserPathView>,
}

impl HttpProgressStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, clock: Clock) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            clock,
        }
    }

    fn url(&self) -> Result<Url, StorageError> {
        endpoint(&self.base_url, "learning-paths").map_err(StorageError::Connection)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Connection(format!(
        "learning-paths returned {status}: {body}"
    )))
}

#[async_trait]
impl ProgressStore for HttpProgressStore {
    async fn load(&self, owner: &OwnerKey) -> Result<Vec<UserPath>, StorageError> {
        let mut url = self.url()?;
        url.query_pairs_mut().append_pair("userId", owner.as_str());

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(conn)?;
        let records: Vec<UserPathRecord> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let now = self.clock.now();
        records
            .into_iter()
            .map(|r| {
                r.into_path(now)
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn replace_all(&self, owner: &OwnerKey, paths: &[UserPath]) -> Result<(), StorageError> {
        let body = ReplaceRequest {
            user_id: owner.as_str(),
            paths: paths.iter().map(UserPathView::from).collect(),
        };
        let response = self
            .client
            .post(self.url()?)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(conn)?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct AssistantRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    skill: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'a str>,
}

#[derive(Deserialize)]
struct AssistantResponse {
    reply: Option<String>,
    error: Option<String>,
}

/// Assistant that calls `POST /assistant-chat` on a Pathway API.
#[derive(Clone)]
pub struct HttpAssistant {
    client: Client,
    base_url: String,
}

impl HttpAssistant {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn reply(
        &self,
        history: &[ChatMessage],
        skill: Option<&str>,
        level: Option<&str>,
    ) -> Result<String, ChatRelayError> {
        let url = endpoint(&self.base_url, "assistant-chat").map_err(ChatRelayError::Internal)?;
        let response = self
            .client
            .post(url)
            .json(&AssistantRequest {
                messages: history,
                skill,
                level,
            })
            .send()
            .await?;

        let status = response.status();
        let body: AssistantResponse = response.json().await?;
        match (status.is_success(), body.reply, body.error) {
            (true, Some(reply), _) => Ok(reply),
            (_, _, Some(error)) => Err(ChatRelayError::Internal(error)),
            _ => Err(ChatRelayError::Internal(format!(
                "assistant endpoint returned {status}"
            ))),
        }
    }
}
