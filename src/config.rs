//! Configuration management for zbridge
//!
//! Runtime configuration is loaded from environment variables. Upstream
//! platform endpoints are resolved separately by [`crate::platform`].

use anyhow::{bail, Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Access token presented to the upstream platform
    pub upstream_token: String,
    /// Key clients must send as `Bearer` token; `None` leaves `/v1` open
    pub api_key: Option<String>,
    /// Model used when opening upstream sessions; `None` uses the caller's model
    pub session_model: Option<String>,

    /// Total timeout per upstream call (in seconds)
    pub upstream_timeout_seconds: u64,
    /// Connect timeout for upstream calls (in seconds)
    pub connect_timeout_seconds: u64,

    /// Number of recent requests kept for `/debug/requests`
    pub live_requests_capacity: usize,

    /// Enable debug endpoints (development only)
    pub debug_enabled: bool,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let live_requests_capacity: usize = env::var("LIVE_REQUESTS_CAPACITY")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("Invalid LIVE_REQUESTS_CAPACITY")?;
        if live_requests_capacity == 0 {
            bail!("LIVE_REQUESTS_CAPACITY must be greater than zero");
        }

        Ok(Self {
            host: env::var("ZBRIDGE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("ZBRIDGE_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .context("Invalid ZBRIDGE_PORT")?,

            upstream_token: non_empty("UPSTREAM_TOKEN")
                .or_else(|| non_empty("ZAI_TOKEN"))
                .context("UPSTREAM_TOKEN (or ZAI_TOKEN) must be set")?,
            api_key: non_empty("DEFAULT_KEY"),
            session_model: non_empty("SESSION_MODEL"),

            upstream_timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid UPSTREAM_TIMEOUT_SECONDS")?,
            connect_timeout_seconds: env::var("UPSTREAM_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid UPSTREAM_CONNECT_TIMEOUT_SECONDS")?,

            live_requests_capacity,

            debug_enabled: env::var("ZBRIDGE_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
