//! Authentication middleware
//!
//! Checks the client's bearer token against `DEFAULT_KEY`. With no key
//! configured every request passes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::{error::AppError, AppState};

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Compare without short-circuiting on the first differing byte
fn keys_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Authentication middleware
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = extract_bearer_token(auth_header).ok_or(AppError::InvalidToken)?;

    if !keys_match(token, expected) {
        warn!("Rejected request with invalid API key");
        return Err(AppError::InvalidToken);
    }

    debug!("Client authenticated");
    Ok(next.run(request).await)
}
