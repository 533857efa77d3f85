use async_trait::async_trait;

use crate::chat_relay::{ChatMessage, ChatRelay};
use crate::error::ChatRelayError;

/// Number of trailing messages sent with each request.
pub const HISTORY_WINDOW: usize = 6;

pub const GREETING: &str = "Hi! I'm your AI Learning Assistant. Tell me your goal (e.g., \"learn React for a job-ready project\") and I'll craft a plan, resources, and practice tasks.";

/// Shown in place of a reply when the assistant cannot be reached.
pub const APOLOGY: &str =
    "Sorry, I couldn't reach the learning engine. Please verify the server and your API key.";

pub const DEFAULT_LEVEL: &str = "beginner";

/// Anything that can answer a windowed conversation.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(
        &self,
        history: &[ChatMessage],
        skill: Option<&str>,
        level: Option<&str>,
    ) -> Result<String, ChatRelayError>;
}

#[async_trait]
impl Assistant for ChatRelay {
    async fn reply(
        &self,
        history: &[ChatMessage],
        skill: Option<&str>,
        level: Option<&str>,
    ) -> Result<String, ChatRelayError> {
        self.respond(history, skill, level).await
    }
}

/// Client-side chat state.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    skill: Option<String>,
    level: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Starts with the assistant greeting, no skill focus and beginner level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            skill: None,
            level: Some(DEFAULT_LEVEL.to_string()),
        }
    }

    #[must_use]
    pub fn with_skill(mut self, skill: Option<String>) -> Self {
        self.skill = skill.filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Option<String>) -> Self {
        self.level = level.filter(|l| !l.trim().is_empty());
        self
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Trailing slice sent to the assistant.
    #[must_use]
    pub fn window(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        &self.messages[start..]
    }

    /// Append the user's message and the assistant's answer.
    ///
    /// Blank input is ignored and returns `None`. A failed request appends
    /// the apology instead of a reply; earlier messages are kept either way.
    pub async fn send(&mut self, assistant: &dyn Assistant, input: &str) -> Option<&ChatMessage> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(input));

        let reply = assistant
            .reply(self.window(), self.skill.as_deref(), self.level.as_deref())
            .await;
        let content = match reply {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                APOLOGY.to_string()
            }
        };
        self.messages.push(ChatMessage::assistant(content));
        self.messages.last()
    }
}
