//! Container-level handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::context::ListParams;
use crate::error::StorageResult;
use crate::models::BlobListResult;

use super::{log_failure, BlobState};

/// PUT /{account}/{container} - Create container.
pub async fn create_container(
    State(state): State<BlobState>,
    Path((account, container)): Path<(String, String)>,
) -> StorageResult<Response> {
    state
        .store
        .create_container(&account, &container)
        .await
        .inspect_err(|e| log_failure(e, "create container", &account, &container, None))?;

    info!(%account, %container, "container created");
    Ok((
        StatusCode::CREATED,
        format!("Container {} created successfully", container),
    )
        .into_response())
}

/// DELETE /{account}/{container} - Delete container and everything in it.
pub async fn delete_container(
    State(state): State<BlobState>,
    Path((account, container)): Path<(String, String)>,
) -> StorageResult<StatusCode> {
    state
        .store
        .delete_container(&account, &container)
        .await
        .inspect_err(|e| log_failure(e, "delete container", &account, &container, None))?;

    info!(%account, %container, "container deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// HEAD /{account}/{container} - 200 if the container exists, 404 otherwise.
pub async fn container_exists(
    State(state): State<BlobState>,
    Path((account, container)): Path<(String, String)>,
) -> StorageResult<StatusCode> {
    let exists = state.store.container_exists(&account, &container).await?;
    Ok(if exists {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    })
}

/// GET /{account}/{container}?prefix=&maxresults= - List blobs.
pub async fn list_blobs(
    State(state): State<BlobState>,
    Path((account, container)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> StorageResult<Json<BlobListResult>> {
    let prefix = params.prefix();
    let max_results = params.max_results();

    let blobs = state
        .store
        .list_blobs(&account, &container, prefix, max_results)
        .await
        .inspect_err(|e| log_failure(e, "list blobs", &account, &container, None))?;

    Ok(Json(BlobListResult {
        blobs,
        prefix: prefix.unwrap_or_default().to_string(),
        max_results: max_results.unwrap_or(0),
    }))
}
