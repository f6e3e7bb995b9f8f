use axum::{Json, extract::State, http::StatusCode};

use super::common::ResetResponse;
use crate::{response::ApiResponse, routes::common::error_response, state::AppState};

/// DELETE /api/scanner/session
pub async fn end_session(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<()>>) {
    let mut station = state.station().lock().await;
    match station.end().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Volunteer session ended")),
        ),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/scanner/scan
///
/// Discards the current registration and any unsaved marks.
pub async fn reset_scan(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<ResetResponse>>) {
    let discarded = state.station().lock().await.reset();
    let message = if discarded {
        "Scan discarded"
    } else {
        "Nothing to discard"
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(ResetResponse { discarded }, message)),
    )
}
