//! Optional API key check for the REST API
//!
//! With `server.api.api_key` set, every route except `/health` needs a
//! matching `X-Api-Key` header. Rejections carry the usual [`ApiError`] body.

use crate::api::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Routes reachable without a key (liveness checks)
const OPEN_PATHS: &[&str] = &["/health"];

/// Reject requests without the configured API key
///
/// Passes everything through when no key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.server.api.api_key.as_deref() else {
        return next.run(request).await;
    };
    if OPEN_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    match check_key(request.headers(), expected) {
        Ok(()) => next.run(request).await,
        Err(message) => {
            tracing::warn!(path = %request.uri().path(), reason = message, "Rejected API request");
            (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message))).into_response()
        }
    }
}

fn check_key(headers: &HeaderMap, expected: &str) -> Result<(), &'static str> {
    let provided = headers
        .get(API_KEY_HEADER)
        .ok_or("Missing X-Api-Key header")?
        .to_str()
        .map_err(|_| "Invalid API key")?;

    if keys_match(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err("Invalid API key")
    }
}

/// Compares every byte, whatever the position of the first mismatch
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
