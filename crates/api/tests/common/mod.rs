#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use githook_api::router::build_app;
use githook_api::state::AppState;
use githook_core::config::{Config, JobDefinition, StaticConfigSource};
use githook_core::scripting::ProcessExecutor;
use githook_events::ConfiguredSinks;
use githook_pipeline::{DispatchCoordinator, RequestHandler};

/// Records every request body it sees and answers with a fixed response.
#[derive(Default)]
pub struct RecordingHandler {
    pub requests: Mutex<Vec<Vec<u8>>>,
}

impl RecordingHandler {
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }
}

impl RequestHandler for RecordingHandler {
    fn handle(&self, request: &[u8]) -> Vec<u8> {
        self.requests.lock().unwrap().push(request.to_vec());
        b"handled".to_vec()
    }
}

/// A coordinator whose only job is `repo1`, running `/bin/true`.
pub fn coordinator() -> DispatchCoordinator {
    coordinator_with(&["/bin/true"])
}

/// A coordinator whose only job is `repo1`, running `script`.
pub fn coordinator_with(script: &[&str]) -> DispatchCoordinator {
    let mut repositories = BTreeMap::new();
    repositories.insert(
        "repo1".to_string(),
        JobDefinition {
            dir: "/tmp".to_string(),
            script: script.iter().map(ToString::to_string).collect(),
        },
    );
    let config = Config {
        repositories,
        ..Config::default()
    };

    DispatchCoordinator::new(
        Arc::new(StaticConfigSource::new(config)),
        Arc::new(ProcessExecutor),
        Arc::new(ConfiguredSinks),
    )
}

/// Build the full application router around `handler`.
pub fn build_test_app(handler: Arc<dyn RequestHandler>) -> Router {
    build_app(AppState::new(handler), Duration::from_secs(30))
}

/// Form-encode a push event for `repository`.
pub fn push_body(repository: &str) -> String {
    let payload = format!(r#"{{"repository":{{"name":"{repository}"}}}}"#);
    serde_urlencoded::to_string([("payload", payload)]).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send(app: Router, method: Method, uri: &str, body: impl Into<Body>) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.into())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
