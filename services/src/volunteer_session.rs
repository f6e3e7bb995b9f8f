//! Volunteer sessions: gate code + identity in, a time-boxed session out.
//!
//! A session moves `Authenticated → Active` once a check-in point is chosen.
//! It is persisted to the device store on every change so a restart (or a
//! reloaded kiosk page) can pick it up again through [`VolunteerSessionManager::resume`].

use chrono::{DateTime, Utc};
use db::models::volunteer_session::Model as StoredSession;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

use crate::backend::EventBackend;
use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Code accepted, no check-in point chosen yet.
    Authenticated,
    /// Bound to a check-in point; scanning is allowed.
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerSession {
    pub session_id: String,
    pub event_id: String,
    pub event_slug: String,
    pub volunteer_name: String,
    pub volunteer_contact: Option<String>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub selected_location: Option<String>,
    pub venues: Vec<String>,
}

impl VolunteerSession {
    pub fn phase(&self) -> SessionPhase {
        if self.selected_location.is_some() {
            SessionPhase::Active
        } else {
            SessionPhase::Authenticated
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a registration for `event` belongs to this session's event.
    pub fn covers_event(&self, event: &str) -> bool {
        event == self.event_id || event == self.event_slug
    }
}

impl From<StoredSession> for VolunteerSession {
    fn from(m: StoredSession) -> Self {
        let venues = m.venue_list();
        Self {
            session_id: m.session_id,
            event_id: m.event_id,
            event_slug: m.event_slug,
            volunteer_name: m.volunteer_name,
            volunteer_contact: m.volunteer_contact,
            granted_at: m.granted_at,
            expires_at: m.expires_at,
            selected_location: m.selected_location,
            venues,
        }
    }
}

impl From<&VolunteerSession> for StoredSession {
    fn from(s: &VolunteerSession) -> Self {
        StoredSession {
            event_slug: s.event_slug.clone(),
            session_id: s.session_id.clone(),
            event_id: s.event_id.clone(),
            volunteer_name: s.volunteer_name.clone(),
            volunteer_contact: s.volunteer_contact.clone(),
            venues: StoredSession::encode_venues(&s.venues),
            selected_location: s.selected_location.clone(),
            granted_at: s.granted_at,
            expires_at: s.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct VolunteerSessionManager {
    db: DatabaseConnection,
    backend: Arc<dyn EventBackend>,
}

impl VolunteerSessionManager {
    pub fn new(db: DatabaseConnection, backend: Arc<dyn EventBackend>) -> Self {
        Self { db, backend }
    }

    /// Exchanges a gate code for a session and persists it on this device.
    ///
    /// Any other session stored on the device is discarded.
    pub async fn validate(
        &self,
        event_slug: &str,
        code: &str,
        volunteer_name: &str,
        volunteer_contact: Option<&str>,
    ) -> Result<VolunteerSession, ScanError> {
        let name = volunteer_name.trim();
        if name.is_empty() {
            return Err(ScanError::InvalidIdentity);
        }
        let slug = event_slug.trim();
        if slug.is_empty() {
            return Err(ScanError::InvalidCode);
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(ScanError::InvalidCode);
        }

        let granted_at = Utc::now();
        let granted = self.backend.validate_access_code(slug, code, name).await?;
        let contact = volunteer_contact
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        let session = VolunteerSession {
            session_id: granted.session_id,
            event_id: granted.event_id.unwrap_or_else(|| slug.to_owned()),
            event_slug: slug.to_owned(),
            volunteer_name: name.to_owned(),
            volunteer_contact: contact,
            granted_at,
            expires_at: granted.expires_at,
            selected_location: None,
            venues: granted.venues,
        };

        StoredSession::store(&self.db, StoredSession::from(&session)).await?;
        tracing::info!(
            event_slug = %session.event_slug,
            session_id = %session.session_id,
            volunteer = %session.volunteer_name,
            expires_at = %session.expires_at,
            "volunteer session granted"
        );
        Ok(session)
    }

    /// Binds the session to one of its check-in points.
    pub async fn select_location(
        &self,
        session: &VolunteerSession,
        location: &str,
    ) -> Result<VolunteerSession, ScanError> {
        self.ensure_live(session).await?;

        let location = location.trim();
        if !session.venues.iter().any(|v| v == location) {
            return Err(ScanError::InvalidLocation(location.to_owned()));
        }

        let mut next = session.clone();
        next.selected_location = Some(location.to_owned());

        match StoredSession::find_by_event(&self.db, &session.event_slug).await? {
            Some(stored) if stored.session_id == session.session_id => {
                stored.set_location(&self.db, location).await?;
            }
            // Row vanished or was replaced; store the session as it is now.
            _ => {
                StoredSession::store(&self.db, StoredSession::from(&next)).await?;
            }
        }

        tracing::info!(session_id = %next.session_id, %location, "check-in point selected");
        Ok(next)
    }

    pub fn is_expired(&self, session: &VolunteerSession) -> bool {
        session.is_expired_at(Utc::now())
    }

    /// Fails with [`ScanError::SessionExpired`], clearing the stored row, once the TTL has elapsed.
    pub async fn ensure_live(&self, session: &VolunteerSession) -> Result<(), ScanError> {
        if self.is_expired(session) {
            StoredSession::clear(&self.db, &session.event_slug).await?;
            tracing::info!(session_id = %session.session_id, "volunteer session expired");
            return Err(ScanError::SessionExpired);
        }
        Ok(())
    }

    /// Ends the session; a later [`resume`](Self::resume) fails with `NoSession`.
    pub async fn end(&self, session: &VolunteerSession) -> Result<(), ScanError> {
        let removed = StoredSession::clear(&self.db, &session.event_slug).await?;
        tracing::info!(session_id = %session.session_id, removed, "volunteer session ended");
        Ok(())
    }

    /// Restores the persisted session for `event_slug` without code entry.
    pub async fn resume(&self, event_slug: &str) -> Result<VolunteerSession, ScanError> {
        let stored = StoredSession::find_by_event(&self.db, event_slug.trim())
            .await?
            .ok_or(ScanError::NoSession)?;

        let session = VolunteerSession::from(stored);
        self.ensure_live(&session).await?;
        tracing::info!(session_id = %session.session_id, "volunteer session resumed");
        Ok(session)
    }
}
