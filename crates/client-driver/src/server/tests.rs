//! Tests for the stub server: handler routing and driver lifecycle.

use super::handler::{handle_request, HandlerContext};
use super::response::build_response_with_headers;
use super::*;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::expectation::{ExpectedRequest, ExpectedResponse, Method};
use crate::registry::ExpectationRegistry;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_test::traced_test;

fn context(registry: &Arc<ExpectationRegistry>) -> Arc<HandlerContext> {
    Arc::new(HandlerContext {
        registry: Arc::clone(registry),
        unexpected_status: StatusCode::NOT_FOUND,
        near_miss_limit: 3,
    })
}

fn request(method: &str, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn body_string(response: hyper::Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Handler
// =============================================================================

#[tokio::test]
async fn test_handler_serves_matched_expectation() {
    let registry = Arc::new(ExpectationRegistry::new());
    registry.register(
        ExpectedRequest::builder(Method::Get, "/orders")
            .with_param("id", "7")
            .build()
            .unwrap(),
        ExpectedResponse::builder(201)
            .with_body(r#"{"id":7}"#)
            .with_content_type("application/json")
            .with_header("X-Trace", "abc")
            .build()
            .unwrap(),
    );

    let response = handle_request(request("GET", "/orders?id=7", ""), context(&registry))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.headers()["x-trace"], "abc");
    assert!(response.headers().get(UNEXPECTED_HEADER).is_none());
    assert_eq!(body_string(response).await, r#"{"id":7}"#);
    assert!(registry.report().is_clean());
}

#[tokio::test]
async fn test_handler_matches_form_body_params() {
    let registry = Arc::new(ExpectationRegistry::new());
    registry.register(
        ExpectedRequest::builder(Method::Post, "/login")
            .with_param("user", "ann")
            .with_param("remember", "yes")
            .build()
            .unwrap(),
        ExpectedResponse::builder(204).build().unwrap(),
    );

    let req = Request::builder()
        .method("POST")
        .uri("/login?remember=yes")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from_static(b"user=ann")))
        .unwrap();
    let response = handle_request(req, context(&registry)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[traced_test]
async fn test_handler_unexpected_request_diagnostic() {
    let registry = Arc::new(ExpectationRegistry::new());
    registry.register(
        ExpectedRequest::builder(Method::Post, "/orders").build().unwrap(),
        ExpectedResponse::builder(200).build().unwrap(),
    );

    let response = handle_request(request("GET", "/orders", ""), context(&registry))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[UNEXPECTED_HEADER], "true");
    assert_eq!(response.headers()["content-type"], "application/json");

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "No expectation matched this request");
    assert_eq!(body["request"]["method"], "GET");
    assert_eq!(body["request"]["path"], "/orders");
    assert_eq!(body["nearMisses"][0]["satisfiedClauses"], 5);
    assert_eq!(body["nearMisses"][0]["mismatches"][0]["clause"], "method");
    assert_eq!(
        body["nearMisses"][0]["mismatches"][0]["reason"],
        "expected POST, got GET"
    );

    assert_eq!(registry.unexpected_requests().len(), 1);
    assert!(logs_contain("Unexpected request GET /orders"));
}

#[tokio::test]
async fn test_handler_uses_configured_unexpected_status() {
    let registry = Arc::new(ExpectationRegistry::new());
    let ctx = Arc::new(HandlerContext {
        registry: Arc::clone(&registry),
        unexpected_status: StatusCode::IM_A_TEAPOT,
        near_miss_limit: 0,
    });

    let response = handle_request(request("DELETE", "/x", ""), ctx).await.unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["nearMisses"], serde_json::json!([]));
}

#[tokio::test]
async fn test_handler_honors_delay() {
    let registry = Arc::new(ExpectationRegistry::new());
    registry.register(
        ExpectedRequest::builder(Method::Get, "/slow").build().unwrap(),
        ExpectedResponse::builder(200)
            .with_delay(Duration::from_millis(100))
            .build()
            .unwrap(),
    );

    let started = Instant::now();
    let response = handle_request(request("GET", "/slow", ""), context(&registry))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_invalid_header_falls_back_to_internal_error() {
    let response = build_response_with_headers(StatusCode::OK, [("bad header", "v")], "body");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");

    let response = build_response_with_headers(StatusCode::ACCEPTED, [("X-Ok", "v")], "body");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-ok"], "v");
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_server_state_display() {
    assert_eq!(ServerState::Stopped.to_string(), "stopped");
    assert_eq!(ServerState::Running.to_string(), "running");
    assert_eq!(ServerState::from_u8(ServerState::Stopping as u8), ServerState::Stopping);
    assert_eq!(ServerState::from_u8(42), ServerState::Stopped);
}

#[tokio::test]
async fn test_start_and_shutdown() {
    let driver = ClientDriver::new(DriverConfig::default());
    assert_eq!(driver.state(), ServerState::Stopped);
    assert!(driver.base_url().is_none());

    let addr = driver.start().await.unwrap();
    assert_eq!(driver.state(), ServerState::Running);
    assert_ne!(addr.port(), 0);
    assert_eq!(driver.port(), Some(addr.port()));
    assert_eq!(driver.base_url(), Some(format!("http://{addr}")));

    driver.shutdown().await;
    assert_eq!(driver.state(), ServerState::Stopped);
    assert!(driver.local_addr().is_none());

    // Port is released
    assert!(std::net::TcpListener::bind(addr).is_ok());
}

#[tokio::test]
async fn test_start_twice_is_invalid_state() {
    let driver = ClientDriver::launch(DriverConfig::default()).await.unwrap();

    match driver.start().await {
        Err(DriverError::InvalidState { expected, actual }) => {
            assert_eq!(expected, ServerState::Stopped);
            assert_eq!(actual, ServerState::Running);
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    driver.shutdown().await;
}

#[tokio::test]
async fn test_restart_after_shutdown() {
    let driver = ClientDriver::launch(DriverConfig::default()).await.unwrap();
    driver.shutdown().await;
    driver.shutdown().await;
    assert_eq!(driver.state(), ServerState::Stopped);

    driver.start().await.unwrap();
    assert_eq!(driver.state(), ServerState::Running);
    driver.shutdown().await;
}

#[tokio::test]
async fn test_invalid_config_leaves_driver_stopped() {
    let driver = ClientDriver::new(DriverConfig {
        unexpected_status: 42,
        ..Default::default()
    });
    assert!(matches!(
        driver.start().await,
        Err(DriverError::InvalidConfig(_))
    ));
    assert_eq!(driver.state(), ServerState::Stopped);
}

#[tokio::test]
async fn test_bind_conflict_is_bind_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let driver = ClientDriver::new(DriverConfig {
        port,
        ..Default::default()
    });
    let err = driver.start().await.unwrap_err();
    assert!(matches!(err, DriverError::Bind { .. }));
    assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    assert_eq!(driver.state(), ServerState::Stopped);
}

#[test]
fn test_verify_reports_unmet_and_unexpected() {
    let driver = ClientDriver::new(DriverConfig::default());
    assert!(driver.verify().is_ok());

    driver.add_expectation(
        ExpectedRequest::builder(Method::Get, "/a").build().unwrap(),
        ExpectedResponse::builder(200).build().unwrap(),
    );
    match driver.verify() {
        Err(DriverError::Verification(report)) => {
            assert_eq!(report.unsatisfied.len(), 1);
            assert!(report.unexpected.is_empty());
        }
        other => panic!("expected verification failure, got {other:?}"),
    }

    driver.reset();
    driver.assert_satisfied();
}

#[test]
#[should_panic(expected = "Client driver verification failed")]
fn test_assert_satisfied_panics_with_report() {
    let driver = ClientDriver::new(DriverConfig::default());
    driver.add_expectation(
        ExpectedRequest::builder(Method::Get, "/never").build().unwrap(),
        ExpectedResponse::builder(200).build().unwrap(),
    );
    driver.assert_satisfied();
}
