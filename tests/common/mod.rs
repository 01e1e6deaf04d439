//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use bluestack::{Config, EdgeServer};

/// Account name used by the integration tests.
pub const ACCOUNT: &str = "devaccount";

/// Test server wrapper.
pub struct TestServer {
    pub base_url: String,
    pub data_dir: PathBuf,
    _temp: Option<TempDir>,
}

impl TestServer {
    /// Creates and starts a test server on a random port over a fresh data directory.
    pub async fn start() -> Self {
        let temp = TempDir::new().unwrap();
        let mut server = Self::start_in(temp.path()).await;
        server._temp = Some(temp);
        server
    }

    /// Starts a test server over an existing data directory.
    pub async fn start_in(data_dir: &Path) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = Config {
            host: "127.0.0.1".to_string(),
            port,
            data_dir: data_dir.to_path_buf(),
            request_timeout: Duration::from_secs(10),
            ..Config::default()
        };

        let server = EdgeServer::from_config(config).unwrap();

        // Start server in background
        tokio::spawn(async move {
            server
                .serve(listener, std::future::pending())
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            data_dir: data_dir.to_path_buf(),
            _temp: None,
        }
    }

    /// Returns the URL for a container.
    pub fn container_url(&self, container: &str) -> String {
        format!("{}/blob/{}/{}", self.base_url, ACCOUNT, container)
    }

    /// Returns the URL for a blob.
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/blob/{}/{}/{}", self.base_url, ACCOUNT, container, blob)
    }
}

/// Creates a container, asserting success.
pub async fn create_container(server: &TestServer, container: &str) {
    let response = reqwest::Client::new()
        .put(server.container_url(container))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

/// Uploads a blob, asserting success.
pub async fn put_blob(server: &TestServer, container: &str, blob: &str, content: &str) {
    let response = reqwest::Client::new()
        .put(server.blob_url(container, blob))
        .body(content.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}
