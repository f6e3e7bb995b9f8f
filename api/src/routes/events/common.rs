use chrono::Utc;
use serde::Serialize;
use services::access_code::{AccessCode, Countdown};

#[derive(Debug, Default, Serialize)]
pub struct AccessCodeResponse {
    pub event_id: String,
    pub code: String,
    pub issued_at: String,
    pub expires_at: String,
    pub remaining_seconds: i64,
}

impl From<AccessCode> for AccessCodeResponse {
    fn from(c: AccessCode) -> Self {
        let remaining_seconds = (c.expires_at - Utc::now()).num_seconds().max(0);
        Self {
            event_id: c.event_id,
            code: c.code,
            issued_at: c.issued_at.to_rfc3339(),
            expires_at: c.expires_at.to_rfc3339(),
            remaining_seconds,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RotationResponse {
    pub event_id: String,
    pub running: bool,
    pub code: String,
    pub remaining_seconds: u64,
    pub expires_at: String,
    pub rotations: u64,
}

impl From<Countdown> for RotationResponse {
    fn from(c: Countdown) -> Self {
        Self {
            event_id: c.event_id,
            running: true,
            code: c.code,
            remaining_seconds: c.remaining_seconds,
            expires_at: c.expires_at.to_rfc3339(),
            rotations: c.rotations,
        }
    }
}
