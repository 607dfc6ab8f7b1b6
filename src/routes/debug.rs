//! Debug endpoints for development
//!
//! Only available when ZBRIDGE_DEBUG=true. Exposes the live request buffer.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    telemetry::{BufferStats, LiveRequest},
    AppState,
};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LiveRequestsQuery {
    pub limit: Option<usize>,
}

/// Live requests response, oldest first
#[derive(Debug, Serialize)]
pub struct LiveRequestsResponse {
    pub requests: Vec<LiveRequest>,
    pub stats: BufferStats,
}

/// GET /debug/requests - Most recent downstream calls
pub async fn live_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LiveRequestsQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !state.config.debug_enabled {
        return Err(debug_disabled_error());
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    Ok(Json(LiveRequestsResponse {
        requests: state.live_requests.latest(limit),
        stats: state.live_requests.stats(),
    }))
}

/// Helper to return a consistent 404 error when debug is disabled
fn debug_disabled_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": {
                "message": "Debug endpoints are disabled. Set ZBRIDGE_DEBUG=true to enable.",
                "type": "not_found_error",
                "code": "debug_disabled"
            }
        })),
    )
}
