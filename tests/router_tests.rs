//! Edge router tests, driven without a socket.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use bluestack::{create_router, BlobService, Config, FileBlobStore, ServiceRegistry};

fn registry(dir: &TempDir) -> ServiceRegistry {
    let store = FileBlobStore::open(dir.path()).unwrap();
    let mut registry = ServiceRegistry::new();
    registry.register(Arc::new(BlobService::new(Arc::new(store))));
    registry
}

fn router(dir: &TempDir, config: &Config) -> Router {
    create_router(config, &registry(dir))
}

async fn send(router: Router, method: &str, uri: &str) -> axum::response::Response {
    router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let response = send(router(&dir, &Config::default()), "GET", "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "bluestack");
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir, &Config::default());

    let response = send(app.clone(), "GET", "/health").await;
    let generated = response.headers().get("x-request-id").unwrap();
    assert_eq!(generated.len(), 36);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "caller-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "caller-supplied"
    );
}

#[tokio::test]
async fn test_blob_service_nested_under_prefix() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir, &Config::default());

    let response = send(app.clone(), "PUT", "/blob/acct/c1").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(app.clone(), "HEAD", "/blob/acct/c1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, "PUT", "/acct/c2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disabled_service_is_not_mounted() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        enabled_services: vec!["queue".to_string()],
        ..Config::default()
    };
    let app = router(&dir, &config);

    let response = send(app.clone(), "PUT", "/blob/acct/c1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(app, "GET", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
