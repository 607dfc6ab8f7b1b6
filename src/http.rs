//! Pooled HTTP transport for upstream calls

use std::time::Duration;

use crate::config::Config;

/// Idle connections kept per upstream host
const POOL_MAX_IDLE_PER_HOST: usize = 10;
/// How long an idle pooled connection is kept
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Build the shared upstream client.
///
/// The client is cheap to clone and every clone shares one connection pool.
/// Timeouts apply per call.
pub fn build_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .timeout(Duration::from_secs(config.upstream_timeout_seconds))
        .build()
}
