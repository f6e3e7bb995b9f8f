//! Helpers shared by every route group.

use crate::response::ApiResponse;
use axum::{Json, http::StatusCode};
use serde::Serialize;
use services::error::ScanError;
use validator::ValidationErrors;

/// HTTP status for a pipeline error.
///
/// Correctable input is a 400, a lost session is a 401 so the kiosk returns
/// to code entry, and backend trouble is a 502.
pub fn status_for(err: &ScanError) -> StatusCode {
    match err {
        ScanError::InvalidCode
        | ScanError::InvalidIdentity
        | ScanError::InvalidLocation(_)
        | ScanError::LocationNotSelected
        | ScanError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        ScanError::SessionExpired | ScanError::NoSession => StatusCode::UNAUTHORIZED,
        ScanError::NoActiveScan | ScanError::PersonNotFound(_) => StatusCode::NOT_FOUND,
        ScanError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
        ScanError::Database(_) | ScanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response<T>(err: ScanError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::debug!(error = %err, %status, "request rejected");
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

/// Joins the messages of every failed field into one line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validation_response<T>(errors: &ValidationErrors) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(format_validation_errors(errors))),
    )
}
