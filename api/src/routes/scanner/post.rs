use axum::{Json, extract::State, http::StatusCode};
use services::scan_recorder::SyncReport;
use validator::Validate;

use super::common::{
    BeginSessionReq, ResumeSessionReq, SaveResponse, ScanReq, ScanResponse, SessionResponse,
    ToggleReq,
};
use crate::{
    response::ApiResponse,
    routes::common::{error_response, validation_response},
    state::AppState,
};

/// POST /api/scanner/session
///
/// Exchanges a gate code and volunteer name for a session. Any session
/// already on this device is replaced.
///
/// - `201 Created` with the session
/// - `400 Bad Request` for a missing name or a wrong/expired code
/// - `502 Bad Gateway` when the backend cannot be reached
pub async fn begin_session(
    State(state): State<AppState>,
    Json(req): Json<BeginSessionReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    if let Err(errors) = req.validate() {
        return validation_response(&errors);
    }

    let mut station = state.station().lock().await;
    match station
        .begin(
            &req.event_slug,
            &req.code,
            &req.volunteer_name,
            req.volunteer_contact.as_deref(),
        )
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Volunteer session started",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/scanner/session/resume
pub async fn resume_session(
    State(state): State<AppState>,
    Json(req): Json<ResumeSessionReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    if let Err(errors) = req.validate() {
        return validation_response(&errors);
    }

    let mut station = state.station().lock().await;
    match station.resume(&req.event_slug).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Volunteer session resumed",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/scanner/scan
///
/// Decodes a scanned QR code. An unreadable code is a `400` and the flow
/// keeps accepting scans.
pub async fn scan(
    State(state): State<AppState>,
    Json(req): Json<ScanReq>,
) -> (StatusCode, Json<ApiResponse<ScanResponse>>) {
    if let Err(errors) = req.validate() {
        return validation_response(&errors);
    }

    let mut station = state.station().lock().await;
    match station.scan(&req.raw).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ScanResponse::from(view),
                "Registration scanned",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/scanner/scan/toggle
pub async fn toggle_person(
    State(state): State<AppState>,
    Json(req): Json<ToggleReq>,
) -> (StatusCode, Json<ApiResponse<ScanResponse>>) {
    if let Err(errors) = req.validate() {
        return validation_response(&errors);
    }

    let mut station = state.station().lock().await;
    match station.toggle(&req.person_id).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ScanResponse::from(view),
                "Attendance updated",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/scanner/scan/save
///
/// Saves the current registration and resets for the next scan. A failed
/// submission still answers `200`: the record is kept on the device and the
/// message carries the warning.
pub async fn save_scan(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<SaveResponse>>) {
    let mut station = state.station().lock().await;
    match station.save().await {
        Ok(outcome) => {
            let message = outcome
                .warning
                .clone()
                .unwrap_or_else(|| "Attendance saved".into());
            (
                StatusCode::OK,
                Json(ApiResponse::success(SaveResponse::from(outcome), message)),
            )
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/scanner/history/sync
pub async fn sync_history(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<SyncReport>>) {
    // The pass makes one backend call per record; scanning carries on meanwhile.
    let recorder = state.station().lock().await.recorder();
    match recorder.retry_unsynced().await {
        Ok(report) => {
            let message = format!(
                "Synced {} of {} unsynced scans",
                report.synced, report.attempted
            );
            (StatusCode::OK, Json(ApiResponse::success(report, message)))
        }
        Err(e) => error_response(e),
    }
}
