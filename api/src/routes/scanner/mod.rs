//! `/api/scanner`: the volunteer's scanning flow on this device.
//!
//! - `POST   /session`            → validate gate code + name, start a session
//! - `POST   /session/resume`     → pick up the session persisted on this device
//! - `PUT    /session/location`   → bind the session to a check-in point
//! - `DELETE /session`            → end the session
//! - `GET    /status`             → session, current scan, unsynced count
//! - `POST   /scan`               → decode a scanned QR code
//! - `POST   /scan/toggle`        → flip one person present/pending
//! - `DELETE /scan`               → discard the current scan
//! - `POST   /scan/save`          → save and reset for the next scan
//! - `GET    /history`            → this session's saved scans
//! - `POST   /history/sync`       → resubmit unsynced scans

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

mod common;
mod delete;
mod get;
mod post;
mod put;

pub use common::{
    BeginSessionReq, LocationReq, ResumeSessionReq, SaveResponse, ScanRecordResponse, ScanReq,
    ScanResponse, SessionResponse, StatusResponse, ToggleReq,
};
pub use delete::{end_session, reset_scan};
pub use get::{get_history, get_status};
pub use post::{begin_session, resume_session, save_scan, scan, sync_history, toggle_person};
pub use put::select_location;

pub fn scanner_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/session", post(begin_session).delete(end_session))
        .route("/session/resume", post(resume_session))
        .route("/session/location", put(select_location))
        .route("/status", get(get_status))
        .route("/scan", post(scan).delete(reset_scan))
        .route("/scan/toggle", post(toggle_person))
        .route("/scan/save", post(save_scan))
        .route("/history", get(get_history))
        .route("/history/sync", post(sync_history))
        .with_state(app_state)
}
