//! Chat completions endpoint
//!
//! OpenAI-compatible chat completions on top of the two-phase adapter.
//! Handles both streaming and non-streaming responses.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use crate::{
    adapter::{Role, UnifiedMessage},
    error::AppError,
    streaming::{buffered_answer_stream, collect_answer, translate_stream, StreamMetadata},
    telemetry::{metrics::record_request, LiveRequest, RequestContext},
    AppState,
};

const ENDPOINT: &str = "/v1/chat/completions";

/// Chat message as sent by OpenAI clients.
///
/// `content` is either a string or an array of content parts; only text
/// parts are forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<Value>,
}

impl ChatMessage {
    /// Flatten the content into plain text
    pub fn text(&self) -> String {
        match &self.content {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

impl From<&ChatMessage> for UnifiedMessage {
    fn from(message: &ChatMessage) -> Self {
        UnifiedMessage::new(Role::from(message.role.clone()), message.text())
    }
}

/// Chat completion request
///
/// Sampling parameters are accepted for compatibility but the upstream has
/// no way to receive them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Handle chat completion requests
///
/// Every call, successful or not, is recorded in the live request buffer.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut model = None;
    let response = match handle_chat(&state, &body, &mut model).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    let status = response.status();
    let duration = start_time.elapsed();

    if !status.is_success() {
        record_request(
            "error",
            model.as_deref().unwrap_or("unknown"),
            duration.as_secs_f64(),
        );
    }

    state.live_requests.push(LiveRequest::new(
        Method::POST.as_str(),
        ENDPOINT,
        status.as_u16(),
        duration.as_millis() as u64,
        user_agent,
        model,
    ));

    response
}

async fn handle_chat(
    state: &AppState,
    body: &[u8],
    model_out: &mut Option<String>,
) -> Result<Response, AppError> {
    let request: ChatCompletionRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let resolved = state.platform.resolve_model(&request.model);
    *model_out = Some(resolved.requested.clone());

    let ctx = RequestContext::new(state.platform.id.as_str(), ENDPOINT)
        .with_model(resolved.requested.clone())
        .with_streaming(request.stream);
    ctx.log_request_start(request.messages.len());

    let messages: Vec<UnifiedMessage> = request.messages.iter().map(UnifiedMessage::from).collect();

    let upstream = match state
        .adapter
        .chat_completion(&resolved.upstream, &messages, request.stream)
        .instrument(ctx.create_span())
        .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            ctx.log_error(&e.to_string());
            return Err(e.into());
        }
    };

    ctx.log_upstream_open(upstream.session_id(), upstream.status());
    let meta = StreamMetadata::new(resolved.requested.clone());

    if request.stream {
        record_request(
            "streaming",
            &resolved.requested,
            ctx.start_time.elapsed().as_secs_f64(),
        );

        let body = if upstream.is_event_stream() {
            Body::from_stream(translate_stream(upstream.into_byte_stream(), meta, ctx))
        } else {
            // Upstream answered with one document despite the stream request
            ctx.log_warning("upstream ignored stream request, relaying buffered answer");
            let text = upstream.text().await.map_err(|e| {
                ctx.log_error(&e.to_string());
                AppError::from(e)
            })?;
            let content = collect_answer(&text);
            ctx.log_request_complete(content.len());
            Body::from_stream(buffered_answer_stream(content, meta))
        };

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::CONNECTION, "keep-alive")
            .header("X-Accel-Buffering", "no")
            .body(body)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

        return Ok(response);
    }

    let text = upstream.text().await.map_err(|e| {
        ctx.log_error(&e.to_string());
        AppError::from(e)
    })?;
    let content = collect_answer(&text);

    record_request(
        "success",
        &resolved.requested,
        ctx.start_time.elapsed().as_secs_f64(),
    );
    ctx.log_request_complete(content.len());

    Ok((StatusCode::OK, Json(meta.completion(content))).into_response())
}
