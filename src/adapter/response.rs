//! Caller-owned handle to a phase-2 response body

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;

use super::error::{AdapterError, AdapterResult, Phase};

/// Stream of raw body chunks from the upstream
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Open upstream response returned by a successful message send.
///
/// The body has not been read yet. Consuming it through
/// [`ResponseStream::into_byte_stream`] yields data as it arrives; dropping the
/// handle (drained or not) releases the pooled connection.
#[derive(Debug)]
pub struct ResponseStream {
    session_id: String,
    response: reqwest::Response,
}

impl ResponseStream {
    pub(crate) fn new(session_id: impl Into<String>, response: reqwest::Response) -> Self {
        Self {
            session_id: session_id.into(),
            response,
        }
    }

    /// Upstream session this response belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// HTTP status of the upstream response
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// Upstream `Content-Type`, if present and valid
    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether the upstream answered with an event stream
    pub fn is_event_stream(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.starts_with("text/event-stream"))
    }

    /// Consume the handle as an incremental chunk stream
    pub fn into_byte_stream(self) -> ByteStream {
        Box::pin(self.response.bytes_stream())
    }

    /// Read the whole body into a string
    pub async fn text(self) -> AdapterResult<String> {
        let mut stream = self.into_byte_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AdapterError::transport(Phase::SendMessage, e))?;
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
