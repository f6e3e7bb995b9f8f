use serde::{Deserialize, Serialize};
use services::qr_payload::RegistrationPayload;
use services::scan_recorder::ScanRecord;
use services::station::{LiveStatus, SaveOutcome, ScanView, StationStatus};
use services::volunteer_session::{SessionPhase, VolunteerSession};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct BeginSessionReq {
    #[validate(length(min = 1, max = 128, message = "Event is required"))]
    pub event_slug: String,
    #[validate(length(min = 1, max = 16, message = "Access code is required"))]
    pub code: String,
    #[serde(default)]
    pub volunteer_name: String,
    #[validate(length(max = 256, message = "Contact must be at most 256 characters"))]
    pub volunteer_contact: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResumeSessionReq {
    #[validate(length(min = 1, max = 128, message = "Event is required"))]
    pub event_slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(length(min = 1, max = 128, message = "Location is required"))]
    pub location: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScanReq {
    #[validate(length(min = 1, max = 8192, message = "Scanned content must be 1-8192 characters"))]
    pub raw: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleReq {
    #[validate(length(min = 1, message = "person_id is required"))]
    pub person_id: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub event_id: String,
    pub event_slug: String,
    pub volunteer_name: String,
    pub volunteer_contact: Option<String>,
    pub phase: String,
    pub selected_location: Option<String>,
    pub venues: Vec<String>,
    pub granted_at: String,
    pub expires_at: String,
}

impl From<VolunteerSession> for SessionResponse {
    fn from(s: VolunteerSession) -> Self {
        let phase = match s.phase() {
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Active => "active",
        };
        Self {
            phase: phase.into(),
            session_id: s.session_id,
            event_id: s.event_id,
            event_slug: s.event_slug,
            volunteer_name: s.volunteer_name,
            volunteer_contact: s.volunteer_contact,
            selected_location: s.selected_location,
            venues: s.venues,
            granted_at: s.granted_at.to_rfc3339(),
            expires_at: s.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ScanResponse {
    pub registration: Option<RegistrationPayload>,
    pub present_count: usize,
    pub total_count: usize,
    /// `merged` when marks from other volunteers were applied, `unavailable` otherwise.
    pub live_status: String,
}

impl From<ScanView> for ScanResponse {
    fn from(v: ScanView) -> Self {
        let live_status = match v.live_status {
            LiveStatus::Merged => "merged",
            LiveStatus::Unavailable => "unavailable",
        };
        Self {
            registration: Some(v.payload),
            present_count: v.present_count,
            total_count: v.total_count,
            live_status: live_status.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ScanRecordResponse {
    pub scan_id: String,
    pub registration_id: String,
    pub location: String,
    pub present_count: u32,
    pub total_count: u32,
    pub captured_at: String,
    pub sync_status: String,
    pub synced_at: Option<String>,
    pub last_error: Option<String>,
    pub snapshot: Option<RegistrationPayload>,
}

impl From<ScanRecord> for ScanRecordResponse {
    fn from(r: ScanRecord) -> Self {
        Self {
            sync_status: r.sync_status.to_string(),
            scan_id: r.scan_id,
            registration_id: r.registration_id,
            location: r.location,
            present_count: r.present_count,
            total_count: r.total_count,
            captured_at: r.captured_at.to_rfc3339(),
            synced_at: r.synced_at.map(|t| t.to_rfc3339()),
            last_error: r.last_error,
            snapshot: Some(r.snapshot),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SaveResponse {
    pub record: ScanRecordResponse,
    pub warning: Option<String>,
}

impl From<SaveOutcome> for SaveResponse {
    fn from(o: SaveOutcome) -> Self {
        Self {
            record: o.record.into(),
            warning: o.warning,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct StatusResponse {
    pub session: Option<SessionResponse>,
    pub current: Option<ScanResponse>,
    pub unsynced: u64,
}

impl From<StationStatus> for StatusResponse {
    fn from(s: StationStatus) -> Self {
        Self {
            session: s.session.map(SessionResponse::from),
            current: s.current.map(ScanResponse::from),
            unsynced: s.unsynced,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ResetResponse {
    pub discarded: bool,
}
