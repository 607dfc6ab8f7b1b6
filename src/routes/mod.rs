//! HTTP routes for zbridge
//!
//! This module defines all HTTP endpoints exposed by the bridge.

pub mod chat;
pub mod debug;
pub mod health;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{middleware::auth::auth_middleware, AppState};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // OpenAI-compatible routes, gated by DEFAULT_KEY when set
    let api_routes = Router::new()
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/models", get(models::list_models))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes (health checks, metrics, debug) - no auth required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/debug/requests", get(debug::live_requests));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware; outermost layer listed first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
