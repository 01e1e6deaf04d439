//! Blob-level handlers.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;

use crate::context::{content_type, metadata_from_headers};
use crate::error::StorageResult;
use crate::models::default_content_type;

use super::{insert_date, insert_metadata, log_failure, BlobState};

/// PUT /{account}/{container}/{blob} - Upload blob, replacing any existing one.
///
/// The container is created if it does not exist yet.
pub async fn put_blob(
    State(state): State<BlobState>,
    Path((account, container, blob)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StorageResult<Response> {
    let size = body.len();
    let metadata = metadata_from_headers(&headers);

    state
        .store
        .put_blob(
            &account,
            &container,
            &blob,
            body,
            content_type(&headers),
            metadata,
        )
        .await
        .inspect_err(|e| log_failure(e, "put blob", &account, &container, Some(&blob)))?;

    info!(%account, %container, %blob, size, "blob uploaded");
    Ok((
        StatusCode::CREATED,
        format!("Blob {} uploaded successfully", blob),
    )
        .into_response())
}

/// GET /{account}/{container}/{blob} - Download blob content with its properties
/// as headers.
pub async fn get_blob(
    State(state): State<BlobState>,
    Path((account, container, blob)): Path<(String, String, String)>,
) -> StorageResult<Response> {
    let found = state
        .store
        .get_blob(&account, &container, &blob)
        .await
        .inspect_err(|e| log_failure(e, "get blob", &account, &container, Some(&blob)))?;

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&found.content_type)
        .or_else(|_| HeaderValue::from_str(&default_content_type()));
    if let Ok(content_type) = content_type {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(found.size));
    insert_date(&mut headers, header::LAST_MODIFIED, &found.modified_at);
    insert_date(
        &mut headers,
        HeaderName::from_static("x-ms-creation-time"),
        &found.created_at,
    );
    insert_metadata(&mut headers, &found.metadata);

    info!(%account, %container, %blob, size = found.size, "blob downloaded");
    Ok((StatusCode::OK, headers, found.content).into_response())
}

/// DELETE /{account}/{container}/{blob} - Delete blob.
pub async fn delete_blob(
    State(state): State<BlobState>,
    Path((account, container, blob)): Path<(String, String, String)>,
) -> StorageResult<StatusCode> {
    state
        .store
        .delete_blob(&account, &container, &blob)
        .await
        .inspect_err(|e| log_failure(e, "delete blob", &account, &container, Some(&blob)))?;

    info!(%account, %container, %blob, "blob deleted");
    Ok(StatusCode::NO_CONTENT)
}
