use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::common::{AccessCodeResponse, RotationResponse};
use crate::{
    response::ApiResponse,
    state::AppState,
    ws::access_code::{emit_rotated, spawn_countdown_forwarder},
};

/// POST /api/events/{event_id}/access-code
///
/// Issues a fresh code, superseding the current one. Falls back to a locally
/// generated code when the backend is unreachable.
pub async fn issue_access_code(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<AccessCodeResponse>>) {
    let code = state.access_codes().issue(&event_id).await;
    emit_rotated(state.ws(), &code, "issued").await;
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AccessCodeResponse::from(code),
            "Access code issued",
        )),
    )
}

/// POST /api/events/{event_id}/access-code/refresh
pub async fn refresh_access_code(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<AccessCodeResponse>>) {
    let code = state.access_codes().refresh(&event_id).await;
    emit_rotated(state.ws(), &code, "manual").await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AccessCodeResponse::from(code),
            "Access code refreshed",
        )),
    )
}

/// POST /api/events/{event_id}/access-code/rotation
///
/// Starts automatic rotation. Countdown ticks are published on the
/// `access_code:{event_id}` websocket topic. Starting twice is a no-op.
pub async fn start_rotation(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<RotationResponse>>) {
    let (rx, started) = state.access_codes().start_rotation(&event_id).await;
    let snapshot = rx.borrow().clone();
    let message = if started {
        spawn_countdown_forwarder(state.ws_clone(), rx);
        "Rotation started"
    } else {
        "Rotation already running"
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(RotationResponse::from(snapshot), message)),
    )
}
