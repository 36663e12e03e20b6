//! Integration tests for the HTTP listener.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{body_json, body_text, get, push_body, send, RecordingHandler};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app(Arc::new(RecordingHandler::default()));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn health_check_does_not_reach_the_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let app = common::build_test_app(handler.clone());
    get(app, "/health").await;

    assert!(handler.requests().is_empty());
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(Arc::new(RecordingHandler::default()));
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Webhook delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn any_path_and_method_is_a_webhook() {
    let handler = Arc::new(RecordingHandler::default());

    for (method, uri) in [
        (Method::POST, "/"),
        (Method::POST, "/hooks/github"),
        (Method::PUT, "/anything"),
        (Method::POST, "/health"),
    ] {
        let app = common::build_test_app(handler.clone());
        let response = send(app, method, uri, "payload=x").await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_text(response).await, "handled");
    }

    assert_eq!(handler.requests().len(), 4);
    assert!(handler.requests().iter().all(|r| r == b"payload=x"));
}

#[tokio::test]
async fn webhook_is_acknowledged_before_the_job_finishes() {
    let coordinator = common::coordinator();
    let app = common::build_test_app(Arc::new(coordinator.clone()));

    let response = send(app, Method::POST, "/", push_body("repo1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        body_text(response).await,
        "Running job for repository: repo1"
    );
    assert!(coordinator.shutdown(std::time::Duration::from_secs(10)).await);
}

#[tokio::test]
async fn unknown_repository_is_reported_in_the_body() {
    let coordinator = common::coordinator();
    let app = common::build_test_app(Arc::new(coordinator.clone()));

    let response = send(app, Method::POST, "/", push_body("ghost")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "ERROR UnknownRepository: no job configured for repository: ghost"
    );
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test]
async fn missing_payload_is_reported_in_the_body() {
    let app = common::build_test_app(Arc::new(common::coordinator()));

    let response = send(app, Method::POST, "/", "ref=main").await;

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.starts_with("ERROR MissingPayload:"), "{text}");
}
