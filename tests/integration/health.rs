//! Health and metrics endpoint integration tests
//!
//! - GET /health - Full status
//! - GET /health/ready - Readiness probe
//! - GET /health/live - Liveness probe
//! - GET /metrics - Prometheus text

use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::TestHarness;

#[tokio::test]
async fn test_health_check() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["platform"]["id"], "zread");
    assert_eq!(json["platform"]["chat_url"], harness.upstream.chat_url());
    assert_eq!(json["stats"]["live_requests"]["capacity"], 100);
    assert_eq!(json["stats"]["live_requests"]["size"], 0);
}

#[tokio::test]
async fn test_readiness_check() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health/ready").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_check() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health/live").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    zbridge::telemetry::metrics::init_metrics();
    let harness = TestHarness::new().await;
    zbridge::telemetry::metrics::record_request("success", "glm-4.5", 0.01);

    let response = harness.server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("zbridge_requests_total"));
}
