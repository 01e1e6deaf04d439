//! Edge HTTP server.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StorageResult;
use crate::router::create_router;
use crate::service::{BlobService, ServiceRegistry};
use crate::storage::FileBlobStore;

/// Error type returned by the server entry points.
pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// The edge server: a single port in front of every enabled service.
pub struct EdgeServer {
    config: Arc<Config>,
    registry: ServiceRegistry,
}

impl EdgeServer {
    /// Creates a server over an already populated registry.
    pub fn new(config: Config, registry: ServiceRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    /// Opens the file blob store under `config.data_dir` and registers every
    /// built-in service.
    pub fn from_config(config: Config) -> StorageResult<Self> {
        let store = FileBlobStore::open(&config.data_dir)?;

        let mut registry = ServiceRegistry::new();
        registry.register(Arc::new(BlobService::new(Arc::new(store))));
        info!(count = registry.len(), "registered services");

        Ok(Self::new(config, registry))
    }

    /// Builds the edge router for this server.
    pub fn router(&self) -> Router {
        create_router(&self.config, &self.registry)
    }

    /// Binds the configured address and serves until Ctrl+C.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_address()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let app = self.router();

        info!(address = %addr, "listening on edge port");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        info!("edge server stopped");
        Ok(())
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        self.config.bind_address()
    }

    /// Returns the base URL for the edge port.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.bind_address())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
