//! OpenAI-compatible output
//!
//! Response and chunk shapes returned to clients, plus the translation from
//! an upstream byte stream into `chat.completion.chunk` SSE events.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::{EventDecoder, UpstreamEvent};
use crate::adapter::ByteStream;
use crate::telemetry::RequestContext;

/// Identity shared by every chunk of one completion
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    /// Unique identifier for this completion
    pub id: String,
    pub model: String,
    /// Unix timestamp of creation
    pub created: i64,
}

impl StreamMetadata {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            model: model.into(),
            created: chrono::Utc::now().timestamp(),
        }
    }

    /// Chunk carrying one fragment of answer text
    pub fn content_chunk(&self, content: String) -> ChatCompletionChunk {
        self.chunk(
            ChunkDelta {
                role: None,
                content: Some(content),
            },
            None,
        )
    }

    /// Terminal chunk with an empty delta and `finish_reason: "stop"`
    pub fn finish_chunk(&self) -> ChatCompletionChunk {
        self.chunk(ChunkDelta::default(), Some("stop".to_string()))
    }

    /// Non-streaming completion wrapping the full answer
    pub fn completion(&self, content: String) -> ChatCompletion {
        ChatCompletion {
            id: self.id.clone(),
            object: "chat.completion".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![CompletionChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
        }
    }

    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<String>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }
}

/// Non-streaming chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// One streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    /// Serialized as `null` until the last chunk
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Format a chunk as an SSE data event: `data: {json}\n\n`
pub fn format_sse_chunk(chunk: &ChatCompletionChunk) -> Bytes {
    let json = serde_json::to_string(chunk).expect("ChatCompletionChunk should always serialize");
    Bytes::from(format!("data: {}\n\n", json))
}

/// The OpenAI stream termination marker: `data: [DONE]\n\n`
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Re-encode an upstream event stream as OpenAI chunks.
///
/// Each `answer` fragment is forwarded as soon as its frame is complete.
/// The finish chunk and `[DONE]` are emitted exactly once, whether the
/// upstream sent `event:finish` or simply closed. A transport error ends the
/// stream without them.
pub fn translate_stream(
    upstream: ByteStream,
    meta: StreamMetadata,
    ctx: RequestContext,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
    async_stream::stream! {
        let mut upstream = upstream;
        let mut decoder = EventDecoder::new();
        let mut chunks = 0usize;
        let mut finished = false;

        while let Some(item) = upstream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => {
                    ctx.log_error(&format!("upstream stream error: {}", e));
                    yield Err(e);
                    return;
                }
            };

            for event in decoder.feed(&bytes) {
                match event {
                    UpstreamEvent::Answer(text) => {
                        chunks += 1;
                        yield Ok(format_sse_chunk(&meta.content_chunk(text)));
                    }
                    UpstreamEvent::Finish => {
                        finished = true;
                        break;
                    }
                }
            }

            if finished {
                break;
            }
        }

        if !finished {
            for event in decoder.finish() {
                if let UpstreamEvent::Answer(text) = event {
                    chunks += 1;
                    yield Ok(format_sse_chunk(&meta.content_chunk(text)));
                }
            }
            ctx.log_warning("upstream closed without a finish event");
        }

        yield Ok(format_sse_chunk(&meta.finish_chunk()));
        yield Ok(format_sse_done());

        ctx.log_stream_ended(chunks);
    }
}

/// Emit an already-aggregated answer as a complete OpenAI chunk stream.
///
/// Used when the upstream ignored the stream request and answered with a
/// single document. An empty answer produces only the finish chunk and
/// `[DONE]`.
pub fn buffered_answer_stream(
    content: String,
    meta: StreamMetadata,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
    let mut events = Vec::with_capacity(3);
    if !content.is_empty() {
        events.push(Ok(format_sse_chunk(&meta.content_chunk(content))));
    }
    events.push(Ok(format_sse_chunk(&meta.finish_chunk())));
    events.push(Ok(format_sse_done()));
    futures::stream::iter(events)
}
