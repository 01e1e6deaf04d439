//! Edge router: one entry point that dispatches to every enabled service.

use axum::{
    extract::{ConnectInfo, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use tracing::info;

use crate::config::Config;
use crate::service::ServiceRegistry;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the edge router with the middleware stack applied.
///
/// Registered services that are not enabled in `config` are skipped.
pub fn create_router(config: &Config, registry: &ServiceRegistry) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for service in registry.iter() {
        if config.is_service_enabled(service.name()) {
            info!(service = service.name(), "registering service routes");
            router = router.nest(&format!("/{}", service.name()), service.router());
        } else {
            info!(service = service.name(), "skipping service (not enabled)");
        }
    }

    // Outermost first.
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(log_request))
            .layer(CatchPanicLayer::new())
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(CorsLayer::permissive()),
    )
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "bluestack",
    }))
}

async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        %query,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        %remote_addr,
        %request_id,
        "request completed"
    );
    response
}
