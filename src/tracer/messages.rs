use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role in a recorded conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    /// Map an engine's own role name onto a [`MessageRole`]
    ///
    /// Engines disagree on naming (`human`/`ai` in LangChain, `model` in Google ADK), so
    /// every alias seen in their payloads is accepted. Unknown roles yield `None`.
    pub fn from_native(role: &str) -> Option<Self> {
        match role.to_ascii_lowercase().as_str() {
            "system" | "developer" => Some(Self::System),
            "user" | "human" => Some(Self::User),
            "assistant" | "ai" | "model" => Some(Self::Assistant),
            "tool" | "function" => Some(Self::Tool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{role, content}` record of `gen_ai.input.messages`
///
/// Roles are kept as the engine reported them, after mapping the common aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatRecord {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System.as_str(), content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User.as_str(), content)
    }

    /// Build a record from a native role name, normalizing known aliases
    pub fn from_native(role: &str, content: impl Into<String>) -> Self {
        let role = MessageRole::from_native(role)
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|| role.to_string());
        Self::new(role, content)
    }
}

/// Message in the conversation reconstructed from a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Tool, content)
    }
}
