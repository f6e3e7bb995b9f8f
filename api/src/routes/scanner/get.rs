use axum::{Json, extract::State, http::StatusCode};

use super::common::{ScanRecordResponse, StatusResponse};
use crate::{response::ApiResponse, routes::common::error_response, state::AppState};

/// GET /api/scanner/status
///
/// Session (if any), the registration being marked and the number of scans
/// waiting to be synced. An expired session is dropped and reported as absent.
pub async fn get_status(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<StatusResponse>>) {
    let mut station = state.station().lock().await;
    match station.status().await {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StatusResponse::from(status),
                "Station status retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/scanner/history
///
/// Scans saved during the current session on this device, newest first.
pub async fn get_history(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<ScanRecordResponse>>>) {
    let mut station = state.station().lock().await;
    match station.history().await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records.into_iter().map(ScanRecordResponse::from).collect(),
                "Scan history retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}
