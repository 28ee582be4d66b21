// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload endpoints.
//!
//! Upload steps run on their own task so a dropped connection never cancels
//! a sequence halfway through; the handler just awaits the result.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};

use crate::{
    error::{ApiError, ErrorBody},
    models::{ManualTableRequest, UploadQuery, UploadResponse},
    state::AppState,
    vault::{Category, StagedFile, UploadOutcome, UploadSnapshot, VaultError},
};

fn status_for(outcome: &UploadOutcome) -> StatusCode {
    match outcome {
        UploadOutcome::Stored(_) => StatusCode::CREATED,
        UploadOutcome::AwaitingTable(_) => StatusCode::ACCEPTED,
    }
}

async fn detached<F>(task: F) -> Result<UploadOutcome, ApiError>
where
    F: std::future::Future<Output = Result<UploadOutcome, VaultError>> + Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|e| ApiError::internal(format!("upload task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Encrypt, sign and store one file.
///
/// The request body is the raw file; `Content-Type` and the file extension
/// decide whether it is accepted (PDF, PNG, JPG).
#[utoipa::path(
    post,
    path = "/v1/vault/files",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    tag = "Upload",
    responses(
        (status = 201, description = "Stored", body = UploadResponse),
        (status = 202, description = "Paused until a table name is supplied", body = UploadResponse),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Signature declined", body = ErrorBody),
        (status = 409, description = "Wrong network or upload already running", body = ErrorBody),
        (status = 422, description = "Unsupported file or category", body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let category = match query.category.as_deref() {
        Some(label) => label.parse::<Category>()?,
        None => Category::Uncategorized,
    };
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let file = StagedFile::new(query.name, content_type, body.to_vec())?;

    let upload = state.upload.clone();
    let outcome = detached(async move { upload.upload(file, category).await }).await?;
    Ok((
        status_for(&outcome),
        Json(UploadResponse::new(outcome, state.upload.snapshot())),
    ))
}

/// Current upload state and status line.
#[utoipa::path(
    get,
    path = "/v1/vault/upload",
    tag = "Upload",
    responses((status = 200, body = UploadSnapshot))
)]
pub async fn upload_status(State(state): State<AppState>) -> Json<UploadSnapshot> {
    Json(state.upload.snapshot())
}

/// Resume a paused upload with a table name.
#[utoipa::path(
    post,
    path = "/v1/vault/upload/table",
    request_body = ManualTableRequest,
    tag = "Upload",
    responses(
        (status = 201, description = "Stored", body = UploadResponse),
        (status = 404, description = "Unusable table name; still paused", body = ErrorBody),
        (status = 409, description = "No upload is paused", body = ErrorBody)
    )
)]
pub async fn provide_table(
    State(state): State<AppState>,
    Json(request): Json<ManualTableRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let upload = state.upload.clone();
    let outcome =
        detached(async move { upload.provide_table(&request.table_name).await }).await?;
    Ok((
        status_for(&outcome),
        Json(UploadResponse::new(outcome, state.upload.snapshot())),
    ))
}

/// Discard a paused or finished upload.
#[utoipa::path(
    delete,
    path = "/v1/vault/upload",
    tag = "Upload",
    responses(
        (status = 204),
        (status = 409, description = "A step is still running", body = ErrorBody)
    )
)]
pub async fn discard_upload(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.upload.reset()?;
    Ok(StatusCode::NO_CONTENT)
}
