//! Bluestack: a local emulator for Azure-style storage services.
//!
//! A single edge port routes requests to each enabled service. The blob
//! service keeps containers and blobs as plain files under a data directory.
//!
//! # Example
//!
//! ```no_run
//! use bluestack::{Config, EdgeServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = EdgeServer::from_config(Config::default()).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod router;
pub mod server;
pub mod service;
pub mod storage;

// Re-exports for convenience
pub use config::{Args, Cli, Command, Config, ConfigError, DEFAULT_EDGE_PORT};
pub use error::{ErrorCode, ErrorKind, StorageError, StorageResult};
pub use router::create_router;
pub use server::{EdgeServer, ServerError};
pub use service::{BlobService, Service, ServiceRegistry};
pub use storage::{BlobEngine, BlobStore, FileBlobStore};
