//! Adapter error taxonomy

use std::fmt;

use thiserror::Error;

/// Upstream call an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Phase 1: open a talk session
    CreateTalk,
    /// Phase 2: send content into the session
    SendMessage,
}

impl Phase {
    /// Short label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::CreateTalk => "create_talk",
            Phase::SendMessage => "send_message",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while driving the two-phase protocol.
///
/// Nothing is retried: every failure reaches the caller with the phase it
/// happened in.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{phase}: failed to encode request: {source}")]
    Serialization {
        phase: Phase,
        #[source]
        source: serde_json::Error,
    },

    #[error("{phase}: transport error: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: reqwest::Error,
    },

    #[error("{phase}: upstream returned status {status}: {body}")]
    UpstreamStatus { phase: Phase, status: u16, body: String },

    #[error("{phase}: unexpected response body: {message}")]
    ResponseParse { phase: Phase, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid adapter configuration: {0}")]
    Configuration(String),
}

impl AdapterError {
    pub(crate) fn transport(phase: Phase, source: reqwest::Error) -> Self {
        AdapterError::Transport { phase, source }
    }

    pub(crate) fn parse(phase: Phase, message: impl Into<String>) -> Self {
        AdapterError::ResponseParse {
            phase,
            message: message.into(),
        }
    }

    /// Phase the error belongs to, if it came from an upstream call
    pub fn phase(&self) -> Option<Phase> {
        match self {
            AdapterError::Serialization { phase, .. }
            | AdapterError::Transport { phase, .. }
            | AdapterError::UpstreamStatus { phase, .. }
            | AdapterError::ResponseParse { phase, .. } => Some(*phase),
            AdapterError::Protocol(_) | AdapterError::Configuration(_) => None,
        }
    }

    /// Upstream HTTP status for `UpstreamStatus` errors
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AdapterError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;
