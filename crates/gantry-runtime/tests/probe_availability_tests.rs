//! Tests for HTTP health probing against a live endpoint.
//!
//! The probe contract: a success status within the timeout is `Success`;
//! everything else (non-success status, timeout, refused connection) is a
//! single `Failure`.

use std::time::Duration;

use httpmock::prelude::*;

use gantry_core::domain::ProbeOutcome;
use gantry_core::ports::HealthProbe;
use gantry_runtime::{HttpHealthProbe, check_http_health, wait_for_http_health};

const HEALTH_PATH: &str = "/_stcore/health";

#[tokio::test]
async fn healthy_endpoint_probes_success() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(HEALTH_PATH);
            then.status(200).body("ok");
        })
        .await;

    let probe =
        HttpHealthProbe::new(server.port(), HEALTH_PATH, Duration::from_secs(10)).unwrap();
    assert_eq!(probe.probe().await, ProbeOutcome::Success);
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_probes_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HEALTH_PATH);
            then.status(503);
        })
        .await;

    let probe =
        HttpHealthProbe::new(server.port(), HEALTH_PATH, Duration::from_secs(10)).unwrap();
    match probe.probe().await {
        ProbeOutcome::Failure { reason } => assert!(reason.contains("503")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_endpoint_times_out_as_one_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HEALTH_PATH);
            then.status(200).delay(Duration::from_secs(2));
        })
        .await;

    let probe =
        HttpHealthProbe::new(server.port(), HEALTH_PATH, Duration::from_millis(200)).unwrap();
    match probe.probe().await {
        ProbeOutcome::Failure { reason } => assert!(reason.contains("timeout")),
        other => panic!("expected timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn check_http_health_reports_true_for_live_endpoint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HEALTH_PATH);
            then.status(200);
        })
        .await;

    let healthy = check_http_health(server.port(), HEALTH_PATH, Duration::from_secs(10))
        .await
        .unwrap();
    assert!(healthy);
}

#[tokio::test]
async fn wait_for_http_health_succeeds_once_endpoint_is_up() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HEALTH_PATH);
            then.status(200);
        })
        .await;

    wait_for_http_health(server.port(), HEALTH_PATH, 5)
        .await
        .expect("endpoint should be reported healthy");
}

#[tokio::test]
async fn wait_for_http_health_gives_up_after_timeout() {
    // Nothing listens on this port.
    let err = wait_for_http_health(65431, HEALTH_PATH, 1)
        .await
        .expect_err("should time out");
    assert!(err.to_string().contains("did not become healthy"));
}
