//! Integration tests for the decision tree API.
//!
//! Each test builds the router against a temporary tree file. The
//! `served_over_tcp` test binds a real listener on an ephemeral port.
//!
//! Run with: cargo test --test integration

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use decision_tree_api::api::{cors_layer, create_router, AppState};
use decision_tree_api::config::Config;
use decision_tree_api::tree::TreeStore;

const SCENARIO_TREE: &str =
    r#"{"root": {"question": "Q1", "options": [{"label":"A","next":null}]}}"#;

/// A temp workspace holding a tree file and an optional static bundle.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn tree_path(&self) -> PathBuf {
        self.dir.path().join("decision_tree.json")
    }

    fn write_tree(&self, contents: &str) {
        fs::write(self.tree_path(), contents).unwrap();
    }

    fn static_dir(&self) -> PathBuf {
        self.dir.path().join("static")
    }

    fn write_static(&self, relative: &str, contents: &str) {
        let path = self.static_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(&self, frontend_url: Option<&str>) -> Config {
        Config {
            frontend_url: frontend_url.map(str::to_string),
            tree_file: self.tree_path(),
            static_dir: self.static_dir(),
            ..Config::default()
        }
    }

    fn app(&self, frontend_url: Option<&str>) -> Router {
        let config = self.config(frontend_url);
        build_app(&config, AppState::new(TreeStore::new(&config.tree_file)))
    }
}

fn build_app(config: &Config, state: AppState) -> Router {
    let cors = cors_layer(&config.allowed_origins()).unwrap();
    create_router(state, cors, config.static_dir_if_present())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn scenario_tree_is_returned_exactly() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    let app = fixture.app(None);

    let (status, body) = get(&app, "/api/tree").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!({"root": {"question": "Q1", "options": [{"label": "A", "next": null}]}})
    );
}

#[tokio::test]
async fn key_order_of_the_document_is_preserved() {
    let fixture = Fixture::new();
    fixture.write_tree(r#"{"phases":[],"nodes":[],"meta":{"z":1,"a":2}}"#);
    let app = fixture.app(None);

    let (status, body) = get(&app, "/api/tree").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"phases":[],"nodes":[],"meta":{"z":1,"a":2}}"#
    );
}

#[tokio::test]
async fn numbers_are_returned_as_written() {
    let contents = r#"{"id":123456789012345678901234567890,"neg":-0,"ratio":1.50}"#;
    let fixture = Fixture::new();
    fixture.write_tree(contents);
    let app = fixture.app(None);

    let response = app
        .oneshot(Request::builder().uri("/api/tree").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), contents);
}

#[tokio::test]
async fn health_survives_a_missing_tree_file() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    let app = fixture.app(None);

    assert_eq!(get(&app, "/api/tree").await.0, StatusCode::OK);

    fs::rename(fixture.tree_path(), fixture.dir.path().join("moved.json")).unwrap();

    let (status, body) = get(&app, "/api/tree").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["code"], "DATA_UNAVAILABLE");

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!({"status": "ok", "message": "Decision Tree API"})
    );
}

#[tokio::test]
async fn truncated_tree_reports_a_descriptive_error() {
    let fixture = Fixture::new();
    fixture.write_tree(&SCENARIO_TREE[..SCENARIO_TREE.len() / 2]);
    let app = fixture.app(None);

    let (status, body) = get(&app, "/api/tree").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body);
    assert_eq!(body["code"], "DATA_MALFORMED");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("decision_tree.json"));
    assert!(message.contains("not valid JSON"));

    assert_eq!(get(&app, "/").await.0, StatusCode::OK);
}

#[tokio::test]
async fn edits_are_visible_without_restart() {
    let fixture = Fixture::new();
    fixture.write_tree(r#"{"version": 1}"#);
    let app = fixture.app(None);

    assert_eq!(json_body(&get(&app, "/api/tree").await.1), json!({"version": 1}));

    fixture.write_tree(r#"{"version": 2}"#);
    assert_eq!(json_body(&get(&app, "/api/tree").await.1), json!({"version": 2}));
}

#[tokio::test]
async fn frontend_url_origin_is_allowed() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    let app = fixture.app(Some("https://tree.example.com"));

    let request = |origin: &str| {
        Request::builder()
            .uri("/api/tree")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(request("https://tree.example.com"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://tree.example.com"
    );

    let rejected = app
        .oneshot(request("https://other.example.com"))
        .await
        .unwrap();
    assert!(rejected
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn static_bundle_serves_unmatched_paths() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    fixture.write_static("index.html", "<html>root</html>");
    fixture.write_static("assets/app.js", "console.log('tree');");
    fixture.write_static("docs/index.html", "<html>docs</html>");
    let app = fixture.app(None);

    let (status, body) = get(&app, "/assets/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log('tree');");

    let (status, body) = get(&app, "/docs/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>docs</html>");

    let (status, _) = get(&app, "/assets/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_routes_take_precedence_over_static_bundle() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    fixture.write_static("index.html", "<html>root</html>");
    fixture.write_static("api/tree", "shadowed");
    let app = fixture.app(None);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "ok");

    let (status, body) = get(&app, "/api/tree").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["root"]["question"], "Q1");
}

#[tokio::test]
async fn static_dir_created_after_startup_is_not_mounted() {
    let fixture = Fixture::new();
    let app = fixture.app(None);
    fixture.write_static("late.html", "<html>late</html>");

    let (status, body) = get(&app, "/late.html").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body), json!({"detail": "Not Found"}));
}

#[tokio::test]
async fn metrics_endpoint_renders_when_enabled() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    let config = fixture.config(None);

    // Built, not installed, so tests don't fight over the global recorder.
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let state = AppState::new(TreeStore::new(&config.tree_file)).with_metrics(handle);
    let app = build_app(&config, state);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[test]
fn tree_store_loads_outside_the_server() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);

    let tree = tokio_test::block_on(TreeStore::new(fixture.tree_path()).load()).unwrap();

    assert_eq!(tree.kind(), "object");
    assert_eq!(json_body(tree.as_bytes())["root"]["options"][0]["label"], "A");
}

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn served_over_tcp() {
    let fixture = Fixture::new();
    fixture.write_tree(SCENARIO_TREE);
    let addr = spawn_server(fixture.app(None)).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok", "message": "Decision Tree API"}));

    let response = client
        .get(format!("http://{addr}/api/tree"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    let tree: Value = response.json().await.unwrap();
    assert_eq!(tree, serde_json::from_str::<Value>(SCENARIO_TREE).unwrap());
}
