//! Mapping of numbering failures to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::numbering::NumberingError;
use tracing::{error, warn};

/// Builds the JSON error response for `e`.
///
/// Body shape: `{"error": "<snake_case code>", "message": "<text>"}`.
pub fn error_response(e: &NumberingError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match e {
        NumberingError::StoreUnavailable(_) => {
            error!(error = %e, "Sequence store unavailable");
        }
        NumberingError::Contention { .. } => {
            warn!(error = %e, "Allocation contended");
        }
        _ => {}
    }

    let message = match e {
        // Backend details stay in the logs.
        NumberingError::StoreUnavailable(_) => {
            "Numbering storage is temporarily unavailable".to_string()
        }
        other => other.to_string(),
    };

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": message,
        })),
    )
        .into_response()
}

/// Builds a 400 response for a malformed request value.
pub fn bad_request(error: &str, message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error, "message": message.into() })),
    )
        .into_response()
}
