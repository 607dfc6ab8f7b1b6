//! Telemetry: live request log, logging context and metrics

pub mod context;
pub mod metrics;
pub mod ring_buffer;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use context::RequestContext;
pub use ring_buffer::{BufferStats, RingBuffer};

/// Metadata about one completed downstream call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveRequest {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: u64,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LiveRequest {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        duration_ms: u64,
        user_agent: impl Into<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            method: method.into(),
            path: path.into(),
            status,
            duration_ms,
            user_agent: user_agent.into(),
            model,
        }
    }
}

/// Recent downstream calls
pub type LiveRequests = RingBuffer<LiveRequest>;
