use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::backend::LiveEventStats;

use super::common::AccessCodeResponse;
use crate::{response::ApiResponse, routes::common::error_response, state::AppState};

/// GET /api/events/{event_id}/access-code
///
/// Returns the cached code while it is valid, otherwise issues a new one.
pub async fn get_access_code(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<AccessCodeResponse>>) {
    let code = state.access_codes().current(&event_id).await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AccessCodeResponse::from(code),
            "Access code retrieved",
        )),
    )
}

/// GET /api/events/{event_id}/stats
///
/// Read-only dashboard numbers; `502` when the backend cannot be reached.
pub async fn get_stats(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<LiveEventStats>>) {
    match state.backend().get_live_event_stats(&event_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Live stats retrieved")),
        ),
        Err(e) => error_response(e),
    }
}
