//! The seam between the station and the event backend.
//!
//! Every remote call the pipeline makes goes through [`EventBackend`]. Two
//! implementations exist:
//!
//! - [`HttpBackend`]: JSON over HTTP to the real event service;
//! - [`LocalBackend`]: an in-process stand-in used when no backend URL is
//!   configured (offline kiosks, development, tests).
//!
//! The rest of the crate only ever sees `Arc<dyn EventBackend>`, so the core
//! logic is the same in both modes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScanError;
use crate::qr_payload::{AttendanceStatus, RegistrationPayload};

pub mod http;
pub mod local;

pub use http::HttpBackend;
pub use local::LocalBackend;

/// A gate code as handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful gate-code validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedSession {
    pub session_id: String,
    /// Canonical event id, when the backend distinguishes it from the slug.
    #[serde(default)]
    pub event_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub venues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedScan {
    pub scan_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentScan {
    pub scan_id: String,
    pub registration_id: String,
    pub location: String,
    pub present_count: u32,
    pub total_count: u32,
    pub timestamp: DateTime<Utc>,
}

/// Read-only dashboard numbers for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiveEventStats {
    pub total_registrations: u64,
    pub checked_in: u64,
    pub active_volunteers: u64,
    #[serde(default)]
    pub recent_scans: Vec<RecentScan>,
}

/// Attendance of one person as currently known by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAttendance {
    pub person_id: String,
    pub attendance_status: AttendanceStatus,
    #[serde(default)]
    pub marked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub marked_by: Option<String>,
}

#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn issue_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError>;

    async fn refresh_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError>;

    /// Fails with [`ScanError::InvalidCode`] when the code is wrong or stale.
    async fn validate_access_code(
        &self,
        event_slug: &str,
        code: &str,
        volunteer_name: &str,
    ) -> Result<GrantedSession, ScanError>;

    async fn record_attendance_scan(
        &self,
        session_id: &str,
        location: &str,
        payload: &RegistrationPayload,
    ) -> Result<RecordedScan, ScanError>;

    async fn get_live_event_stats(&self, event_id: &str) -> Result<LiveEventStats, ScanError>;

    async fn fetch_registration_attendance(
        &self,
        event_id: &str,
        registration_id: &str,
    ) -> Result<Vec<PersonAttendance>, ScanError>;
}

/// Picks the backend from configuration: HTTP when `BACKEND_URL` is set,
/// otherwise the local stand-in.
pub fn from_config() -> Result<Arc<dyn EventBackend>, ScanError> {
    let url = util::config::backend_url();
    if url.trim().is_empty() {
        tracing::warn!("BACKEND_URL not set; running against the local backend");
        let backend = LocalBackend::new(
            Duration::from_secs(util::config::access_code_ttl_seconds()),
            chrono::Duration::minutes(util::config::session_ttl_minutes()),
            util::config::check_in_points(),
        );
        return Ok(Arc::new(backend));
    }

    let timeout = Duration::from_secs(util::config::backend_timeout_secs());
    tracing::info!(%url, "using remote event backend");
    Ok(Arc::new(HttpBackend::new(&url, timeout)?))
}
