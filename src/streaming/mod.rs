//! SSE (Server-Sent Events) streaming utilities
//!
//! Line buffering for upstream event streams, decoding of the upstream's
//! `event:` / `data:` frames, and re-encoding as OpenAI-compatible chunks.

pub mod events;
pub mod openai;

pub use events::{collect_answer, EventDecoder, UpstreamEvent};
pub use openai::{
    buffered_answer_stream, format_sse_chunk, format_sse_done, translate_stream, ChatCompletion,
    ChatCompletionChunk, StreamMetadata,
};

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// SSE data arrives as byte chunks that may not align with line boundaries,
/// or even with UTF-8 character boundaries. Bytes are held until a complete
/// line (ending with \n) is available, and only complete lines are decoded.
///
/// # Example
/// ```
/// use zbridge::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// // First chunk contains partial line
/// let lines1 = buffer.feed(b"data:{\"text\":\"hel");
/// assert!(lines1.is_empty()); // No complete lines yet
///
/// // Second chunk completes the line
/// let lines2 = buffer.feed(b"lo\"}\n");
/// assert_eq!(lines2, vec!["data:{\"text\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Raw bytes of the unterminated trailing line
    incomplete: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self {
            incomplete: Vec::new(),
        }
    }

    /// Feed bytes into the buffer and return any complete lines.
    ///
    /// Complete lines are those ending with `\n`. The newline character
    /// is stripped from returned lines and empty lines are dropped.
    /// Incomplete trailing data is retained for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.incomplete.extend_from_slice(bytes);

        let mut complete_lines = Vec::new();

        while let Some(newline_pos) = self.incomplete.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.incomplete.drain(..=newline_pos).collect();
            let line = decode_line(&line);

            // SSE uses blank lines as event separators
            if !line.is_empty() {
                complete_lines.push(line);
            }
        }

        complete_lines
    }

    /// Check if there's any incomplete data remaining in the buffer.
    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }

    /// Take the trailing unterminated line, leaving the buffer empty.
    ///
    /// Call at end of stream: bodies often omit the final newline.
    pub fn take_remaining(&mut self) -> Option<String> {
        let rest = decode_line(&std::mem::take(&mut self.incomplete));
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

/// Decode one line, dropping its terminator.
///
/// Invalid UTF-8 is replaced rather than rejected.
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}
