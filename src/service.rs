//! Services mounted on the edge router.

use axum::{routing::put, Router};
use std::sync::Arc;

use crate::config::BLOB_SERVICE;
use crate::handlers::{self, BlobState};
use crate::storage::BlobStore;

/// A storage service reachable under `/<name>` on the edge port.
pub trait Service: Send + Sync {
    /// Unique service name, also its path prefix.
    fn name(&self) -> &'static str;

    /// Routes relative to the service prefix.
    fn router(&self) -> Router;
}

/// The blob service.
pub struct BlobService {
    state: BlobState,
}

impl BlobService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            state: BlobState::new(store),
        }
    }
}

impl Service for BlobService {
    fn name(&self) -> &'static str {
        BLOB_SERVICE
    }

    fn router(&self) -> Router {
        Router::new()
            .route(
                "/:account/:container",
                put(handlers::create_container)
                    .delete(handlers::delete_container)
                    .head(handlers::container_exists)
                    .get(handlers::list_blobs),
            )
            .route(
                "/:account/:container/*blob",
                put(handlers::put_blob)
                    .get(handlers::get_blob)
                    .delete(handlers::delete_blob),
            )
            .with_state(self.state.clone())
    }
}

/// Services known to this process, in registration order.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service. A later service with the same name replaces the earlier one.
    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services.retain(|s| s.name() != service.name());
        self.services.push(service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Service>> {
        self.services.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Service>> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
