//! E2E tests for health check and basic server functionality

mod common;

use common::{TestServer, numbered};
use std::sync::Once;

static METRICS: Once = Once::new();

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text_format() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_metrics_endpoint_exports_sync_runs() {
    METRICS.call_once(launchsync::metrics::init_metrics);
    let server = TestServer::new().await;
    server.upstream.set_collection("agencies", numbered(2, "Agency"));
    assert_eq!(server.sync_and_wait("agencies").await.status(), 200);

    let body = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("launchsync_sync_runs_total{resource=\"agencies\",status=\"success\"}"));
    assert!(body.contains("launchsync_sync_records_total{resource=\"agencies\"}"));
}

#[tokio::test]
async fn test_sync_status_lists_every_resource() {
    let server = TestServer::new().await;

    let (status, body) = server.get_json("/api/v1/sync").await;

    assert_eq!(status, 200);
    let resources: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["resource"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        resources,
        vec![
            "launches",
            "agencies",
            "launchers",
            "launcher-families",
            "locations",
            "pads",
            "rocket-launches"
        ]
    );
    assert!(body.as_array().unwrap().iter().all(|entry| entry["running"] == false));
}
