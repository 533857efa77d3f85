use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatRelayError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f64 = 0.3;
/// Returned when the provider answers without any message content.
pub const FALLBACK_REPLY: &str = "I couldn't generate a response.";

const PROMPT_PREAMBLE: [&str; 3] = [
    "You are an AI Learning Assistant embedded in Pathway.",
    "Create structured, actionable guidance: learning plan, key topics, curated resources, and practice tasks.",
    "Adapt tone and depth to the user's level. Prefer free, reputable resources when possible.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    fn system(content: String) -> Self {
        Self {
            role: Role::System,
            content,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ProviderConfig {
    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Production deployments never answer with the mock plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("APP_ENV") {
            Ok(v) if v.trim().eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Preamble plus optional skill and level lines.
#[must_use]
pub fn build_system_prompt(skill: Option<&str>, level: Option<&str>) -> String {
    let mut lines: Vec<String> = PROMPT_PREAMBLE.iter().map(|s| (*s).to_string()).collect();
    if let Some(skill) = non_empty(skill) {
        lines.push(format!("Primary skill focus: {skill}."));
    }
    if let Some(level) = non_empty(level) {
        lines.push(format!("Learner level: {level}."));
    }
    lines.join("\n")
}

/// Deterministic study-plan outline used when no provider is configured.
#[must_use]
pub fn mock_reply(history: &[ChatMessage], skill: Option<&str>, level: Option<&str>) -> String {
    let last_user = history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map_or("a learning goal", |m| m.content.as_str());
    let focus = non_empty(skill).map(|s| format!(" (focus: {s})")).unwrap_or_default();
    let lvl = non_empty(level)
        .map(|l| format!(" for {l} level"))
        .unwrap_or_default();
    format!(
        "Here is a short mock study plan{focus}{lvl} based on: \"{last_user}\"\n\n\
         - Week 1: Fundamentals and quick wins\n\
         - Week 2: Core concepts with small projects\n\
         - Week 3: Build a capstone and practice interview-style questions\n\
         - Resources: Official docs, 1-2 curated courses, and 3 hands-on exercises."
    )
}

/// Forwards a conversation to a chat-completion provider, or mocks a reply.
///
/// History windowing is the caller's job; everything passed in is sent.
#[derive(Clone)]
pub struct ChatRelay {
    client: Client,
    provider: Option<ProviderConfig>,
    mode: DeploymentMode,
}

impl ChatRelay {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ProviderConfig::from_env(), DeploymentMode::from_env())
    }

    #[must_use]
    pub fn new(provider: Option<ProviderConfig>, mode: DeploymentMode) -> Self {
        Self {
            client: Client::new(),
            provider,
            mode,
        }
    }

    #[must_use]
    pub fn live(&self) -> bool {
        self.provider.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Produce the assistant's reply to `history`.
    ///
    /// # Errors
    ///
    /// Returns `ChatRelayError::MissingCredential` in production without a provider.
    /// Returns `ChatRelayError::Upstream` with the provider's body on a non-success status.
    /// Returns `ChatRelayError::Internal` for transport or decoding failures.
    pub async fn respond(
        &self,
        history: &[ChatMessage],
        skill: Option<&str>,
        level: Option<&str>,
    ) -> Result<String, ChatRelayError> {
        let Some(config) = self.provider.as_ref() else {
            if self.mode == DeploymentMode::Production {
                tracing::error!("assistant request rejected: no provider credential in production");
                return Err(ChatRelayError::MissingCredential);
            }
            tracing::debug!("no provider credential, answering with mock plan");
            return Ok(mock_reply(history, skill, level));
        };

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(build_system_prompt(skill, level)));
        messages.extend(history.iter().cloned());
        let payload = ChatRequest {
            model: &config.model,
            temperature: TEMPERATURE,
            messages,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "chat provider returned an error");
            return Err(ChatRelayError::Upstream { status, body });
        }

        let body: ChatResponse = response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
