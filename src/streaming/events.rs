//! Upstream event-stream decoding
//!
//! The upstream answers with frames such as
//!
//! ```text
//! event:answer
//! data:{"text":"Hel"}
//!
//! event:finish
//! data:{}
//! ```
//!
//! Only `answer` text and the `finish` marker matter to clients.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::SseLineBuffer;

/// Decoded upstream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// A fragment of the answer text
    Answer(String),
    /// The upstream finished answering
    Finish,
}

#[derive(Debug, Deserialize)]
struct AnswerData {
    #[serde(default)]
    text: Option<String>,
}

/// Incremental decoder from raw body chunks to [`UpstreamEvent`]s
#[derive(Debug, Default)]
pub struct EventDecoder {
    lines: SseLineBuffer,
    current_event: Option<String>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk, returning the events it completes
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<UpstreamEvent> {
        let lines = self.lines.feed(bytes);
        lines
            .iter()
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Flush a trailing line left without a newline at end of body
    pub fn finish(&mut self) -> Vec<UpstreamEvent> {
        match self.lines.take_remaining() {
            Some(line) => self.decode_line(&line).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn decode_line(&mut self, line: &str) -> Option<UpstreamEvent> {
        let line = line.trim();

        if let Some(name) = line.strip_prefix("event:") {
            let name = name.trim();
            if name == "finish" {
                self.current_event = None;
                return Some(UpstreamEvent::Finish);
            }
            self.current_event = Some(name.to_string());
            return None;
        }

        let data = line.strip_prefix("data:")?.trim();
        let event = self.current_event.take();

        match event.as_deref() {
            Some("answer") | None => {}
            Some(_) => return None,
        }

        if data == "[DONE]" {
            return Some(UpstreamEvent::Finish);
        }

        match serde_json::from_str::<AnswerData>(data) {
            Ok(AnswerData { text: Some(text) }) if !text.is_empty() => {
                Some(UpstreamEvent::Answer(text))
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, data = %data, "Skipping undecodable event data");
                None
            }
        }
    }
}

/// Aggregate a fully-read upstream body into the answer text.
///
/// Prefers `answer` events; falls back to a JSON `content` or `response`
/// field, then to the raw body.
pub fn collect_answer(body: &str) -> String {
    let mut decoder = EventDecoder::new();
    let mut events = decoder.feed(body.as_bytes());
    events.extend(decoder.finish());

    let content: String = events
        .into_iter()
        .filter_map(|event| match event {
            UpstreamEvent::Answer(text) => Some(text),
            UpstreamEvent::Finish => None,
        })
        .collect();

    if !content.is_empty() {
        return content;
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["content", "response"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    body.to_string()
}
