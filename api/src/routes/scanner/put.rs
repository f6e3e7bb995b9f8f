use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use super::common::{LocationReq, SessionResponse};
use crate::{
    response::ApiResponse,
    routes::common::{error_response, validation_response},
    state::AppState,
};

/// PUT /api/scanner/session/location
///
/// The location must be one of the check-in points granted with the session.
pub async fn select_location(
    State(state): State<AppState>,
    Json(req): Json<LocationReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    if let Err(errors) = req.validate() {
        return validation_response(&errors);
    }

    let mut station = state.station().lock().await;
    match station.select_location(&req.location).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Check-in point selected",
            )),
        ),
        Err(e) => error_response(e),
    }
}
