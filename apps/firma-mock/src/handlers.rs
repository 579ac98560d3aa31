//! HTTP handlers for the mock signature service

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;
use std::sync::Arc;

use shared_types::{ApiResponse, DownloadResponse, SignatureRequest, SignatureRequestRecord};

use crate::error::MockError;
use crate::models;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(
        "Firma service is running".to_string(),
        "OK",
    ))
}

/// Accept a new signature request
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignatureRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SignatureRequestRecord>>), MockError> {
    let Json(request) = payload.map_err(|e| MockError::InvalidRequest(e.body_text()))?;
    models::validate_request(&request)?;

    let record = models::new_record(request);
    tracing::info!(
        id = %record.id,
        filename = %record.filename,
        members = record.members.len(),
        "Created signature request"
    );
    state.insert(record.clone()).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            record,
            "Signature request created successfully",
        )),
    ))
}

/// List every request in creation order
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<SignatureRequestRecord>>> {
    let requests = state.list().await;
    let message = format!("Retrieved {} requests", requests.len());
    Json(ApiResponse::success(requests, message))
}

/// Fetch one request; the first view moves it to `started`
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SignatureRequestRecord>>, MockError> {
    let record = state
        .update(&id, models::advance_on_view)
        .await
        .ok_or_else(|| MockError::NotFound(id.clone()))?;

    Ok(Json(ApiResponse::success(
        record,
        "Signature request retrieved successfully",
    )))
}

/// Complete the request and hand back the signed document
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DownloadResponse>, MockError> {
    let record = state
        .update(&id, models::complete_on_download)
        .await
        .ok_or_else(|| MockError::NotFound(id.clone()))?;

    let content = BASE64.encode(models::signed_pdf(&record.id));
    tracing::info!(id = %record.id, "Served signed document");

    Ok(Json(DownloadResponse::success(
        content,
        "Document downloaded successfully",
    )))
}

pub async fn audit_trail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, MockError> {
    let record = state
        .get(&id)
        .await
        .ok_or_else(|| MockError::NotFound(id.clone()))?;

    Ok(Json(ApiResponse::success(
        models::audit_trail(&record),
        "Audit trail retrieved successfully",
    )))
}
