//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Status with platform and live-buffer stats
//! - `/health/ready` - Readiness probe
//! - `/health/live` - Liveness probe

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{telemetry::BufferStats, AppState};

/// Health status enum
///
/// Only `healthy` is reported: the upstream is never probed and startup
/// fails before the server binds if configuration is incomplete.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Upstream the bridge is configured for
#[derive(Debug, Serialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
    pub chat_url: String,
    pub default_model: String,
}

/// Application statistics
#[derive(Debug, Serialize)]
pub struct HealthStats {
    pub uptime_seconds: u64,
    pub live_requests: BufferStats,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub platform: PlatformInfo,
    pub stats: HealthStats,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Full health check endpoint
///
/// The upstream is not probed: a probe would open a session on every check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = state.start_time.elapsed().as_secs();

    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        platform: PlatformInfo {
            id: state.platform.id.to_string(),
            name: state.platform.name.clone(),
            chat_url: state.platform.chat_url.clone(),
            default_model: state.platform.default_model_id.clone(),
        },
        stats: HealthStats {
            uptime_seconds: uptime,
            live_requests: state.live_requests.stats(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe endpoint
///
/// Ready as soon as the router is serving; state is fully built first.
pub async fn readiness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness probe endpoint
///
/// Returns 200 OK if the application is alive.
/// Used by Kubernetes liveness probes.
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
