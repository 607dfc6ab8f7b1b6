//! Models endpoint integration tests

use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{constants, TestHarness};

#[tokio::test]
async fn test_list_models() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/models").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["object"], "list");

    let data = json["data"].as_array().unwrap();
    assert_eq!(data[0]["id"], constants::TEST_DEFAULT_MODEL);
    assert!(data.iter().any(|m| m["id"] == "glm-4.5-fast"));
    for model in data {
        assert_eq!(model["object"], "model");
        assert_eq!(model["owned_by"], harness.state.platform.owned_by.as_str());
        assert!(model["created"].as_i64().is_some());
    }
}

#[tokio::test]
async fn test_list_models_does_not_call_upstream() {
    let harness = TestHarness::new().await;

    harness.server.get("/v1/models").await.assert_status_ok();

    assert!(harness.upstream.received_requests().await.is_empty());
}
