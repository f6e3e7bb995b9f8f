use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{response::ApiResponse, state::AppState};

/// DELETE /api/events/{event_id}/access-code/rotation
pub async fn stop_rotation(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    if state.access_codes().stop_rotation(&event_id).await {
        (
            StatusCode::OK,
            Json(ApiResponse::success((), "Rotation stopped")),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No rotation running for this event")),
        )
    }
}
