//! Platform detection from environment variables

use std::collections::BTreeMap;
use std::env;

use tracing::{debug, warn};

use super::{PlatformConfig, PlatformId};

/// Domain substring that identifies zread.ai in `PROVIDER_HOME_URL`
const ZREAD_DOMAIN: &str = "zread.ai";

/// Per-platform fallback values, used when no override is set
struct ProfileDefaults {
    id: PlatformId,
    name: &'static str,
    brand: &'static str,
    home_url: &'static str,
    origin_base: &'static str,
    api_base: &'static str,
    referer_prefix: &'static str,
    chat_url: &'static str,
    models_url: &'static str,
    auth_url: &'static str,
    owned_by: &'static str,
    token_header: &'static str,
    default_model_id: &'static str,
    fe_version: &'static str,
}

const ZAI: ProfileDefaults = ProfileDefaults {
    id: PlatformId::Zai,
    name: "Z.ai",
    brand: "Z.ai",
    home_url: "https://chat.z.ai",
    origin_base: "https://chat.z.ai",
    api_base: "https://chat.z.ai",
    referer_prefix: "/c/",
    chat_url: "https://chat.z.ai/api/chat/completions",
    models_url: "https://chat.z.ai/v1/models",
    auth_url: "https://chat.z.ai/api/v1/auths/",
    owned_by: "z.ai",
    token_header: "Authorization",
    default_model_id: "0727-360B-API",
    fe_version: "prod-fe-1.0.94",
};

const ZREAD: ProfileDefaults = ProfileDefaults {
    id: PlatformId::Zread,
    name: "zread.ai",
    brand: "zread.ai",
    home_url: "https://zread.ai",
    origin_base: "https://zread.ai",
    api_base: "https://zread.ai",
    referer_prefix: "/chat/",
    chat_url: "https://zread.ai/api/chat/completions",
    models_url: "https://zread.ai/v1/models",
    auth_url: "https://zread.ai/api/v1/auths/",
    owned_by: "zread.ai",
    token_header: "Authorization",
    default_model_id: "glm-4.5",
    fe_version: "prod-fe-1.0.94",
};

/// Resolve the platform profile from the process environment.
///
/// Not memoized: callers that need the profile for the whole process
/// lifetime should keep the returned value.
pub fn detect_platform() -> PlatformConfig {
    detect_platform_with(|key| env::var(key).ok())
}

/// Resolve the platform profile using `lookup` as the variable source.
///
/// Empty values are treated as unset. There is no error path: unknown
/// platform identifiers fall back to the Z.ai profile.
pub fn detect_platform_with<F>(lookup: F) -> PlatformConfig
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let platform_id = var("PLATFORM_ID");
    let home_url = var("PROVIDER_HOME_URL");

    let is_zread = platform_id.as_deref() == Some(PlatformId::Zread.as_str())
        || home_url
            .as_deref()
            .is_some_and(|url| url.contains(ZREAD_DOMAIN));

    let profile = if is_zread { &ZREAD } else { &ZAI };
    let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

    let config = PlatformConfig {
        id: profile.id,
        name: or_default("PROVIDER_NAME", profile.name),
        brand: or_default("PROVIDER_BRAND", profile.brand),
        home_url: home_url.unwrap_or_else(|| profile.home_url.to_string()),
        origin_base: or_default("ORIGIN_BASE", profile.origin_base),
        api_base: or_default("PLATFORM_API_BASE", profile.api_base),
        referer_prefix: or_default("REFERER_PREFIX", profile.referer_prefix),
        chat_url: or_default("UPSTREAM_URL", profile.chat_url),
        models_url: or_default("MODELS_URL", profile.models_url),
        auth_url: or_default("AUTH_URL", profile.auth_url),
        owned_by: or_default("OWNED_BY", profile.owned_by),
        token_header: or_default("PLATFORM_TOKEN_HEADER", profile.token_header),
        default_model_id: or_default("UPSTREAM_MODEL_ID_DEFAULT", profile.default_model_id),
        fe_version: or_default("X_FE_VERSION", profile.fe_version),
        model_aliases: var("UPSTREAM_MODEL_ID_MAP")
            .map(|raw| parse_model_aliases(&raw))
            .unwrap_or_default(),
    };

    debug!(
        platform = %config.id,
        chat_url = %config.chat_url,
        default_model = %config.default_model_id,
        aliases = config.model_aliases.len(),
        "Platform resolved"
    );

    config
}

/// Parse a JSON object of `alias -> upstream id` pairs.
///
/// Keys are trimmed and lower-cased; blank keys are skipped. Malformed input
/// yields an empty map.
fn parse_model_aliases(raw: &str) -> BTreeMap<String, String> {
    let parsed: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Failed to parse UPSTREAM_MODEL_ID_MAP, ignoring model aliases");
            return BTreeMap::new();
        }
    };

    parsed
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                return None;
            }
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect()
}
