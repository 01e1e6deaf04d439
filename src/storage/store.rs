//! Async blob store interface and its filesystem implementation.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::engine::BlobEngine;
use crate::error::{StorageError, StorageResult};
use crate::models::{Blob, BlobInfo};

/// Trait for blob storage operations.
#[async_trait]
pub trait BlobStore: Send + Sync {
    // Container operations
    async fn create_container(&self, account: &str, container: &str) -> StorageResult<()>;
    async fn delete_container(&self, account: &str, container: &str) -> StorageResult<()>;
    async fn container_exists(&self, account: &str, container: &str) -> StorageResult<bool>;

    // Blob operations
    async fn put_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        content: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;
    async fn get_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<Blob>;
    async fn delete_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<()>;
    async fn list_blobs(
        &self,
        account: &str,
        container: &str,
        prefix: Option<&str>,
        max_results: Option<usize>,
    ) -> StorageResult<Vec<BlobInfo>>;
}

/// Blob store backed by a [`BlobEngine`]. Cheap to clone.
///
/// Engine calls block on the filesystem, so each one runs on tokio's
/// blocking pool. Dropping the returned future does not stop a call that has
/// already started.
#[derive(Clone)]
pub struct FileBlobStore {
    engine: Arc<BlobEngine>,
}

impl FileBlobStore {
    /// Opens a store rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_engine(Arc::new(BlobEngine::open(data_dir)?)))
    }

    pub fn from_engine(engine: Arc<BlobEngine>) -> Self {
        Self { engine }
    }

    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        F: FnOnce(&BlobEngine) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || op(&engine))
            .await
            .map_err(|e| StorageError::internal(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn create_container(&self, account: &str, container: &str) -> StorageResult<()> {
        let (account, container) = (account.to_owned(), container.to_owned());
        self.run(move |engine| engine.create_container(&account, &container))
            .await
    }

    async fn delete_container(&self, account: &str, container: &str) -> StorageResult<()> {
        let (account, container) = (account.to_owned(), container.to_owned());
        self.run(move |engine| engine.delete_container(&account, &container))
            .await
    }

    async fn container_exists(&self, account: &str, container: &str) -> StorageResult<bool> {
        // Index lookup only, no need for the blocking pool.
        self.engine.container_exists(account, container)
    }

    async fn put_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        content: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        let (account, container, blob) = (account.to_owned(), container.to_owned(), blob.to_owned());
        let content_type = content_type.map(str::to_owned);
        self.run(move |engine| {
            engine.put_blob(
                &account,
                &container,
                &blob,
                &content,
                content_type.as_deref(),
                metadata,
            )
        })
        .await
    }

    async fn get_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<Blob> {
        let (account, container, blob) = (account.to_owned(), container.to_owned(), blob.to_owned());
        self.run(move |engine| engine.get_blob(&account, &container, &blob))
            .await
    }

    async fn delete_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<()> {
        let (account, container, blob) = (account.to_owned(), container.to_owned(), blob.to_owned());
        self.run(move |engine| engine.delete_blob(&account, &container, &blob))
            .await
    }

    async fn list_blobs(
        &self,
        account: &str,
        container: &str,
        prefix: Option<&str>,
        max_results: Option<usize>,
    ) -> StorageResult<Vec<BlobInfo>> {
        let (account, container) = (account.to_owned(), container.to_owned());
        let prefix = prefix.map(str::to_owned);
        self.run(move |engine| {
            engine.list_blobs(&account, &container, prefix.as_deref(), max_results)
        })
        .await
    }
}
