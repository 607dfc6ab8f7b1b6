//! Models endpoint
//!
//! Lists the models this bridge accepts: the platform default followed by
//! every configured alias.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{platform::PlatformConfig, AppState};

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Models list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<Model>,
}

/// Build the model list for a platform
pub fn platform_models(platform: &PlatformConfig) -> ModelsResponse {
    let created = chrono::Utc::now().timestamp();
    let model = |id: &str| Model {
        id: id.to_string(),
        object: "model".to_string(),
        created,
        owned_by: platform.owned_by.clone(),
    };

    let mut data = vec![model(&platform.default_model_id)];
    data.extend(
        platform
            .model_aliases
            .keys()
            .filter(|alias| !alias.eq_ignore_ascii_case(&platform.default_model_id))
            .map(|alias| model(alias)),
    );

    ModelsResponse {
        object: "list".to_string(),
        data,
    }
}

/// List available models
pub async fn list_models(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ModelsResponse>) {
    (StatusCode::OK, Json(platform_models(&state.platform)))
}
