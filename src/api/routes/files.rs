//! File handlers: batch submission and record listing.

use crate::api::AppState;
use crate::types::{FileList, SubmitBatchRequest};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /files - Submit a batch of URLs
///
/// Waits for the whole pipeline to finish. Individual download or upload
/// failures are part of the 200 response; only a failure of the record
/// store produces an error status.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body = SubmitBatchRequest,
    responses(
        (status = 200, description = "Batch processed", body = crate::types::BatchReport),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ApiError),
        (status = 500, description = "Record store failure", body = crate::error::ApiError)
    )
)]
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<SubmitBatchRequest>,
) -> Response {
    match state.relay.submit_batch(request.urls).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Batch submission failed");
            e.into_response()
        }
    }
}

/// GET /files - List every stored file record
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "All stored records, oldest first", body = FileList),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ApiError),
        (status = 500, description = "Record store failure", body = crate::error::ApiError)
    )
)]
pub async fn list_files(State(state): State<AppState>) -> Response {
    match state.relay.list_files().await {
        Ok(data) => (StatusCode::OK, Json(FileList { data })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list files");
            e.into_response()
        }
    }
}
