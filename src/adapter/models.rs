//! Unified messages and upstream wire types

use serde::{Deserialize, Serialize};

/// Conversation role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    /// Any role the adapter has no special handling for
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::System => "system".to_string(),
            Role::User => "user".to_string(),
            Role::Assistant => "assistant".to_string(),
            Role::Tool => "tool".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// One turn of a platform-agnostic conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl UnifiedMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Content of the most recent non-empty `user` turn.
///
/// Scans from the end so multi-turn conversations send the latest question,
/// not the first one. An empty latest user turn counts as missing.
pub fn latest_user_content(messages: &[UnifiedMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .filter(|content| !content.is_empty())
}

/// Phase-1 payload
#[derive(Debug, Clone, Serialize)]
pub struct TalkRequest<'a> {
    pub model: &'a str,
}

/// Phase-1 result: an upstream-assigned session handle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TalkSession {
    pub id: String,
    #[serde(default)]
    pub model: String,
}

/// Phase-2 payload
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest<'a> {
    pub content: &'a str,
    pub model: &'a str,
    pub stream: bool,
}
