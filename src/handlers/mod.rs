//! Request handlers for the blob service.

mod blob;
mod container;

pub use blob::*;
pub use container::*;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::context::{format_http_date, META_HEADER_PREFIX};
use crate::error::StorageError;
use crate::storage::BlobStore;

/// State shared by the blob handlers.
#[derive(Clone)]
pub struct BlobState {
    pub store: Arc<dyn BlobStore>,
}

impl BlobState {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

/// Logs server-side failures. Client errors are left to the request log.
pub(crate) fn log_failure(
    err: &StorageError,
    operation: &str,
    account: &str,
    container: &str,
    blob: Option<&str>,
) {
    if err.is_server_fault() {
        error!(
            account,
            container,
            blob = blob.unwrap_or_default(),
            error = %err,
            "failed to {}",
            operation
        );
    }
}

/// Adds a date header in RFC 1123 form.
pub(crate) fn insert_date(headers: &mut HeaderMap, name: HeaderName, value: &DateTime<Utc>) {
    if let Ok(value) = HeaderValue::from_str(&format_http_date(value)) {
        headers.insert(name, value);
    }
}

/// Adds one `x-ms-meta-<key>` header per metadata entry. Entries that are
/// not valid header text are skipped.
pub(crate) fn insert_metadata(headers: &mut HeaderMap, metadata: &HashMap<String, String>) {
    for (key, value) in metadata {
        let name = HeaderName::from_bytes(format!("{}{}", META_HEADER_PREFIX, key).as_bytes());
        if let (Ok(name), Ok(value)) = (name, HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }
}
