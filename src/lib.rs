//! zbridge - OpenAI-compatible bridge for two-phase chat upstreams
//!
//! This library resolves which upstream platform (chat.z.ai or zread.ai) to
//! talk to, drives its session-then-message protocol, and re-exposes the
//! answers through an OpenAI-style HTTP API.

pub mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod platform;
pub mod routes;
pub mod streaming;
pub mod telemetry;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

pub use crate::adapter::{AdapterConfig, ChatAdapter, TwoPhaseAdapter};
pub use crate::config::Config;
pub use crate::platform::{detect_platform, PlatformConfig};
pub use crate::telemetry::LiveRequests;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Upstream platform, resolved once at startup
    pub platform: PlatformConfig,
    pub adapter: Arc<dyn ChatAdapter>,
    /// Recent downstream calls for `/debug/requests`
    pub live_requests: Arc<LiveRequests>,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let platform = detect_platform();
        info!(
            platform = %platform.id,
            chat_url = %platform.chat_url,
            default_model = %platform.default_model_id,
            "Upstream platform resolved"
        );

        // Shared pooled client for both phases
        let http_client = http::build_client(&config).context("Failed to build HTTP client")?;

        let adapter_config = AdapterConfig::from_platform(&platform, config.upstream_token.clone())
            .with_session_model(config.session_model.clone());
        let adapter: Arc<dyn ChatAdapter> = Arc::new(
            TwoPhaseAdapter::new(http_client, &adapter_config)
                .context("Invalid upstream adapter configuration")?,
        );

        let live_requests = Arc::new(LiveRequests::new(config.live_requests_capacity));

        Ok(Self {
            config,
            platform,
            adapter,
            live_requests,
            start_time: Instant::now(),
        })
    }

    /// Create a new application state for testing with an injected adapter
    ///
    /// Lets integration tests point the adapter at a wiremock server or
    /// replace it with a stub.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        platform: PlatformConfig,
        adapter: Arc<dyn ChatAdapter>,
    ) -> Self {
        let live_requests = Arc::new(LiveRequests::new(config.live_requests_capacity));

        Self {
            config,
            platform,
            adapter,
            live_requests,
            start_time: Instant::now(),
        }
    }
}
