//! Per-request logging context
//!
//! Carries a short correlation id and timing for one downstream request so
//! every log line about it can be tied together.

use std::time::Instant;
use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Context for tracking a request through the adapter
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    pub start_time: Instant,
    /// Platform the request is sent to
    pub platform: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub streaming: bool,
}

impl RequestContext {
    pub fn new(platform: &str, endpoint: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            start_time: Instant::now(),
            platform: platform.to_string(),
            endpoint: endpoint.to_string(),
            model: None,
            streaming: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn log_request_start(&self, message_count: usize) {
        info!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            endpoint = %self.endpoint,
            model = ?self.model,
            streaming = %self.streaming,
            messages = message_count,
            "Request started"
        );
    }

    /// Log that the upstream response is open and about to be relayed
    pub fn log_upstream_open(&self, session_id: &str, status: u16) {
        info!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            session_id = %session_id,
            status = status,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream response opened"
        );
    }

    pub fn log_request_complete(&self, content_len: usize) {
        info!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            endpoint = %self.endpoint,
            model = ?self.model,
            content_len = content_len,
            elapsed_ms = %self.elapsed_ms(),
            "Request completed successfully"
        );
    }

    pub fn log_stream_ended(&self, chunks: usize) {
        info!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            chunks = chunks,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            elapsed_ms = %self.elapsed_ms(),
            message = %message,
            "Warning during request"
        );
    }

    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            platform = %self.platform,
            endpoint = %self.endpoint,
            model = ?self.model,
            streaming = %self.streaming,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Tracing span covering this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "chat_request",
            trace_id = %self.trace_id,
            platform = %self.platform,
            model = ?self.model,
            streaming = %self.streaming,
        )
    }
}
