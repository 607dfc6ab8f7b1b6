//! Browser-style headers for upstream calls
//!
//! The upstream only accepts requests that look like they come from its own
//! web client, so every call carries a fixed user agent plus matching
//! `Origin` and `Referer` values.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT,
};

use super::error::AdapterError;

/// User agent presented to the upstream
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Accept value requesting an event-stream body
pub const EVENT_STREAM: &str = "text/event-stream";

/// Web client version header
pub const FE_VERSION_HEADER: &str = "x-fe-version";

/// Inputs for [`build_browser_headers`]
#[derive(Debug, Clone, Copy)]
pub struct HeaderSettings<'a> {
    pub token_header: &'a str,
    pub token: &'a str,
    pub user_agent: &'a str,
    pub origin: &'a str,
    pub referer: &'a str,
    pub fe_version: Option<&'a str>,
}

/// Build the header set shared by both phases.
///
/// The token is sent as `Bearer <token>` under the configured header name
/// and is marked sensitive so it never shows up in debug output.
pub fn build_browser_headers(settings: HeaderSettings<'_>) -> Result<HeaderMap, AdapterError> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let token_header = HeaderName::from_bytes(settings.token_header.as_bytes()).map_err(|e| {
        AdapterError::Configuration(format!(
            "invalid token header name {:?}: {}",
            settings.token_header, e
        ))
    })?;
    let mut token_value = header_value("token", &format!("Bearer {}", settings.token))?;
    token_value.set_sensitive(true);
    headers.insert(token_header, token_value);

    headers.insert(USER_AGENT, header_value("user agent", settings.user_agent)?);
    headers.insert(ORIGIN, header_value("origin", settings.origin)?);
    headers.insert(REFERER, header_value("referer", settings.referer)?);

    if let Some(version) = settings.fe_version {
        headers.insert(
            HeaderName::from_static(FE_VERSION_HEADER),
            header_value("fe version", version)?,
        );
    }

    Ok(headers)
}

/// Add `Accept: text/event-stream` for streamed message sends
pub fn with_event_stream_accept(mut headers: HeaderMap) -> HeaderMap {
    headers.insert(ACCEPT, HeaderValue::from_static(EVENT_STREAM));
    headers
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue, AdapterError> {
    HeaderValue::from_str(value)
        .map_err(|e| AdapterError::Configuration(format!("invalid {} header value: {}", what, e)))
}
