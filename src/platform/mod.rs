//! Upstream platform profiles
//!
//! A platform profile bundles every endpoint URL, header name and default
//! value needed to talk to one upstream chat service. Profiles are resolved
//! from the environment by [`detect_platform`].

pub mod detect;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use detect::{detect_platform, detect_platform_with};

/// Known upstream platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    /// chat.z.ai
    #[default]
    Zai,
    /// zread.ai
    Zread,
}

impl PlatformId {
    /// Identifier as used in `PLATFORM_ID`
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Zai => "zai",
            PlatformId::Zread => "zread",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for exactly one upstream platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformConfig {
    pub id: PlatformId,
    pub name: String,
    pub brand: String,
    pub home_url: String,
    pub origin_base: String,
    pub api_base: String,
    pub referer_prefix: String,
    /// Session-creation endpoint; message sends go to `{chat_url}/{id}/message`
    pub chat_url: String,
    pub models_url: String,
    pub auth_url: String,
    pub owned_by: String,
    /// Header carrying the `Bearer` access token
    pub token_header: String,
    pub default_model_id: String,
    /// Web client version tag sent as `X-FE-Version`
    pub fe_version: String,
    /// Lower-cased alias -> upstream model id
    pub model_aliases: BTreeMap<String, String>,
}

/// Outcome of mapping a client-facing model name to an upstream model id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Name reported back to the client
    pub requested: String,
    /// Id sent upstream
    pub upstream: String,
}

impl PlatformConfig {
    /// Origin base without a trailing slash
    pub fn origin(&self) -> &str {
        self.origin_base.trim_end_matches('/')
    }

    /// Referer value sent with every upstream call
    pub fn referer(&self) -> String {
        if self.referer_prefix.ends_with('/') {
            format!("{}{}", self.origin(), self.referer_prefix)
        } else {
            format!("{}{}/", self.origin(), self.referer_prefix)
        }
    }

    /// Map a client-supplied model name to the id the upstream expects.
    ///
    /// An empty name selects the platform default. Alias lookup ignores case;
    /// names with no alias are passed through unchanged.
    pub fn resolve_model(&self, requested: &str) -> ResolvedModel {
        let requested = requested.trim();
        if requested.is_empty() {
            return ResolvedModel {
                requested: self.default_model_id.clone(),
                upstream: self.default_model_id.clone(),
            };
        }

        let upstream = self
            .model_aliases
            .get(&requested.to_lowercase())
            .cloned()
            .unwrap_or_else(|| requested.to_string());

        ResolvedModel {
            requested: requested.to_string(),
            upstream,
        }
    }
}
