//! Two-phase completion client
//!
//! Phase 1 opens a talk session at the base endpoint, phase 2 posts the
//! latest user message to `{base}/{session_id}/message`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{debug, error, instrument, warn};

use super::error::{AdapterError, AdapterResult, Phase};
use super::headers::{build_browser_headers, with_event_stream_accept, HeaderSettings, BROWSER_USER_AGENT};
use super::models::{latest_user_content, MessageRequest, TalkRequest, TalkSession, UnifiedMessage};
use super::response::ResponseStream;
use crate::platform::PlatformConfig;
use crate::telemetry::metrics::record_upstream_error;

/// Explicit configuration for a [`TwoPhaseAdapter`]
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Session-creation endpoint; also the base for message sends
    pub base_url: String,
    /// Upstream access token
    pub token: String,
    /// Header carrying the token
    pub token_header: String,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
    /// Sent as `X-FE-Version` when set
    pub fe_version: Option<String>,
    /// Model sent when opening a session. `None` uses the caller's model.
    pub session_model: Option<String>,
}

impl AdapterConfig {
    /// Minimal configuration with the origin derived from `base_url`
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let origin = origin_of(&base_url);
        Self {
            referer: format!("{}/", origin),
            origin,
            base_url,
            token: token.into(),
            token_header: "Authorization".to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            fe_version: None,
            session_model: None,
        }
    }

    /// Configuration targeting a resolved platform
    pub fn from_platform(platform: &PlatformConfig, token: impl Into<String>) -> Self {
        Self {
            base_url: platform.chat_url.clone(),
            token: token.into(),
            token_header: platform.token_header.clone(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            origin: platform.origin().to_string(),
            referer: platform.referer(),
            fe_version: Some(platform.fe_version.clone()),
            session_model: None,
        }
    }

    /// Override the model used for session creation
    pub fn with_session_model(mut self, model: Option<String>) -> Self {
        self.session_model = model.filter(|m| !m.is_empty());
        self
    }
}

/// `scheme://host[:port]` part of a URL, or the input if it has no path
fn origin_of(url: &str) -> String {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(slash) => url[..after_scheme + slash].to_string(),
        None => url.trim_end_matches('/').to_string(),
    }
}

/// Interface to an upstream that needs a session before it takes content.
///
/// Implementations supply the two calls; [`ChatAdapter::chat_completion`]
/// sequences them. Each invocation is independent, so one instance can serve
/// any number of concurrent requests.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Adapter name for logging and metrics
    fn name(&self) -> &str;

    /// Phase 1: open a session
    async fn create_talk(
        &self,
        model: &str,
        messages: &[UnifiedMessage],
    ) -> AdapterResult<TalkSession>;

    /// Phase 2: send `content` into an open session
    async fn send_message(
        &self,
        session_id: &str,
        content: &str,
        model: &str,
        stream: bool,
    ) -> AdapterResult<ResponseStream>;

    /// Run both phases for a unified request.
    ///
    /// The latest user message is located before any upstream call, so a
    /// conversation without one fails with [`AdapterError::Protocol`] and opens
    /// no session. Session creation is never streamed. When the message send
    /// fails the session stays open upstream; there is no teardown call.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[UnifiedMessage],
        stream: bool,
    ) -> AdapterResult<ResponseStream> {
        let content = latest_user_content(messages)
            .ok_or_else(|| AdapterError::Protocol("no user message found".to_string()))?;

        let session = self.create_talk(model, messages).await?;
        debug!(
            adapter = %self.name(),
            session_id = %session.id,
            session_model = %session.model,
            "Talk session opened"
        );

        match self.send_message(&session.id, content, model, stream).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(
                    adapter = %self.name(),
                    session_id = %session.id,
                    error = %e,
                    "Message send failed, upstream session left open"
                );
                Err(e)
            }
        }
    }
}

/// Adapter for chat.z.ai / zread.ai style two-phase upstreams
pub struct TwoPhaseAdapter {
    client: reqwest::Client,
    base_url: String,
    session_model: Option<String>,
    headers: HeaderMap,
}

impl TwoPhaseAdapter {
    /// Create an adapter sharing `client`'s connection pool.
    ///
    /// Fails only when the configured header names or values are not valid
    /// HTTP.
    pub fn new(client: reqwest::Client, config: &AdapterConfig) -> AdapterResult<Self> {
        let headers = build_browser_headers(HeaderSettings {
            token_header: &config.token_header,
            token: &config.token,
            user_agent: &config.user_agent,
            origin: &config.origin,
            referer: &config.referer,
            fe_version: config.fe_version.as_deref(),
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_model: config.session_model.clone(),
            headers,
        })
    }

    /// Endpoint for phase-2 sends into `session_id`
    pub fn message_url(&self, session_id: &str) -> String {
        format!("{}/{}/message", self.base_url, session_id)
    }

    fn encode<T: serde::Serialize>(phase: Phase, payload: &T) -> AdapterResult<Vec<u8>> {
        serde_json::to_vec(payload).map_err(|source| AdapterError::Serialization { phase, source })
    }

    async fn post(
        &self,
        phase: Phase,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> AdapterResult<reqwest::Response> {
        self.client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(phase = %phase, url = %url, error = %e, "Upstream request failed");
                record_upstream_error(phase, None);
                AdapterError::transport(phase, e)
            })
    }

    /// Read the body of a failed response and turn it into an error
    async fn status_error(phase: Phase, response: reqwest::Response) -> AdapterError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(phase = %phase, status = status, body = %body, "Upstream returned error status");
        record_upstream_error(phase, Some(status));
        AdapterError::UpstreamStatus { phase, status, body }
    }
}

#[async_trait]
impl ChatAdapter for TwoPhaseAdapter {
    fn name(&self) -> &str {
        "two_phase"
    }

    #[instrument(skip_all, fields(model = %model, messages = messages.len()))]
    async fn create_talk(
        &self,
        model: &str,
        messages: &[UnifiedMessage],
    ) -> AdapterResult<TalkSession> {
        let phase = Phase::CreateTalk;
        let session_model = self.session_model.as_deref().unwrap_or(model);
        let body = Self::encode(phase, &TalkRequest { model: session_model })?;

        debug!(url = %self.base_url, session_model = %session_model, "Creating talk session");

        let response = self
            .post(phase, &self.base_url, self.headers.clone(), body)
            .await?;

        let status = response.status();
        debug!(status = %status, "Create talk response status");

        if !status.is_success() {
            return Err(Self::status_error(phase, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| AdapterError::transport(phase, e))?;

        let session: TalkSession = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, body = %text, "Failed to parse create talk response");
            record_upstream_error(phase, None);
            AdapterError::parse(phase, format!("{}: {}", e, text))
        })?;

        if session.id.is_empty() {
            record_upstream_error(phase, None);
            return Err(AdapterError::parse(phase, "empty session id"));
        }

        Ok(session)
    }

    #[instrument(skip_all, fields(session_id = %session_id, model = %model, stream = stream))]
    async fn send_message(
        &self,
        session_id: &str,
        content: &str,
        model: &str,
        stream: bool,
    ) -> AdapterResult<ResponseStream> {
        let phase = Phase::SendMessage;
        let body = Self::encode(
            phase,
            &MessageRequest {
                content,
                model,
                stream,
            },
        )?;

        let headers = if stream {
            with_event_stream_accept(self.headers.clone())
        } else {
            self.headers.clone()
        };

        let url = self.message_url(session_id);
        debug!(url = %url, content_len = content.len(), "Sending message");

        let response = self.post(phase, &url, headers, body).await?;

        let status = response.status();
        debug!(status = %status, "Send message response status");

        if !status.is_success() {
            return Err(Self::status_error(phase, response).await);
        }

        Ok(ResponseStream::new(session_id, response))
    }
}
