//! The single scanning flow of one device.
//!
//! [`ScanStation`] is the typed state store behind the scanner routes: at most
//! one volunteer session and at most one registration being marked. Callers
//! hold it behind one async mutex, which serializes decode, toggle, save and
//! reset.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::attendance::AttendanceStateReconciler;
use crate::backend::EventBackend;
use crate::error::ScanError;
use crate::qr_payload::{QrPayloadDecoder, RegistrationPayload};
use crate::scan_recorder::{ScanRecord, ScanRecorder};
use crate::volunteer_session::{SessionPhase, VolunteerSession, VolunteerSessionManager};

/// Whether marks made elsewhere were merged into the current scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    Merged,
    Unavailable,
}

/// The registration currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanView {
    pub payload: RegistrationPayload,
    pub present_count: usize,
    pub total_count: usize,
    pub live_status: LiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub record: ScanRecord,
    /// Set when the record was kept locally but not accepted by the backend.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStatus {
    pub session: Option<VolunteerSession>,
    pub phase: Option<SessionPhase>,
    pub current: Option<ScanView>,
    pub unsynced: u64,
}

#[derive(Debug, Clone)]
struct Current {
    payload: RegistrationPayload,
    live_status: LiveStatus,
}

impl Current {
    fn view(&self) -> ScanView {
        ScanView {
            present_count: AttendanceStateReconciler::present_count(&self.payload),
            total_count: AttendanceStateReconciler::total_count(&self.payload),
            payload: self.payload.clone(),
            live_status: self.live_status,
        }
    }
}

pub struct ScanStation {
    sessions: VolunteerSessionManager,
    recorder: ScanRecorder,
    backend: Arc<dyn EventBackend>,
    session: Option<VolunteerSession>,
    current: Option<Current>,
}

impl ScanStation {
    pub fn new(
        sessions: VolunteerSessionManager,
        recorder: ScanRecorder,
        backend: Arc<dyn EventBackend>,
    ) -> Self {
        Self {
            sessions,
            recorder,
            backend,
            session: None,
            current: None,
        }
    }

    pub async fn begin(
        &mut self,
        event_slug: &str,
        code: &str,
        volunteer_name: &str,
        volunteer_contact: Option<&str>,
    ) -> Result<VolunteerSession, ScanError> {
        let session = self
            .sessions
            .validate(event_slug, code, volunteer_name, volunteer_contact)
            .await?;
        self.session = Some(session.clone());
        self.current = None;
        Ok(session)
    }

    pub async fn resume(&mut self, event_slug: &str) -> Result<VolunteerSession, ScanError> {
        let session = self.sessions.resume(event_slug).await?;
        self.session = Some(session.clone());
        self.current = None;
        Ok(session)
    }

    pub async fn select_location(&mut self, location: &str) -> Result<VolunteerSession, ScanError> {
        let session = self.live_session().await?;
        let session = self.sessions.select_location(&session, location).await?;
        self.session = Some(session.clone());
        Ok(session)
    }

    pub async fn end(&mut self) -> Result<(), ScanError> {
        let session = self.session.take().ok_or(ScanError::NoSession)?;
        self.current = None;
        self.sessions.end(&session).await
    }

    /// Decodes a scanned QR code and makes it the current registration.
    ///
    /// Marks already recorded by other volunteers are merged in when the
    /// backend can be reached; otherwise the payload is shown as decoded.
    pub async fn scan(&mut self, raw: &str) -> Result<ScanView, ScanError> {
        let session = self.live_session().await?;
        if session.selected_location.is_none() {
            return Err(ScanError::LocationNotSelected);
        }

        let payload = QrPayloadDecoder::decode(raw)?;
        if !session.covers_event(payload.event_id()) {
            return Err(ScanError::MalformedPayload(format!(
                "registration belongs to event '{}'",
                payload.event_id()
            )));
        }

        let (payload, live_status) = match self
            .backend
            .fetch_registration_attendance(&session.event_id, payload.registration_id())
            .await
        {
            Ok(live) => (
                AttendanceStateReconciler::merge_live_status(&payload, &live),
                LiveStatus::Merged,
            ),
            Err(err) => {
                tracing::warn!(
                    registration_id = %payload.registration_id(),
                    error = %err,
                    "live attendance unavailable; showing decoded state"
                );
                (payload, LiveStatus::Unavailable)
            }
        };

        if let Some(previous) = &self.current {
            tracing::debug!(
                registration_id = %previous.payload.registration_id(),
                "discarding unsaved scan"
            );
        }

        let current = Current {
            payload,
            live_status,
        };
        let view = current.view();
        tracing::info!(
            registration_id = %view.payload.registration_id(),
            present = view.present_count,
            total = view.total_count,
            "registration scanned"
        );
        self.current = Some(current);
        Ok(view)
    }

    pub async fn toggle(&mut self, person_id: &str) -> Result<ScanView, ScanError> {
        let session = self.live_session().await?;
        let current = self.current.as_mut().ok_or(ScanError::NoActiveScan)?;
        current.payload = AttendanceStateReconciler::toggle(
            &current.payload,
            person_id,
            &session.volunteer_name,
            Utc::now(),
        )?;
        Ok(current.view())
    }

    /// Discards the current registration and any unsaved marks.
    pub fn reset(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Saves the current registration and clears it for the next scan.
    ///
    /// A submission failure leaves the record in local history and is
    /// reported through [`SaveOutcome::warning`].
    pub async fn save(&mut self) -> Result<SaveOutcome, ScanError> {
        let session = self.live_session().await?;
        let location = session
            .selected_location
            .clone()
            .ok_or(ScanError::LocationNotSelected)?;
        let current = self.current.as_ref().ok_or(ScanError::NoActiveScan)?;

        let record = self
            .recorder
            .save(&session, &location, &current.payload)
            .await?;
        self.current = None;

        let warning = (!record.is_synced()).then(|| {
            format!(
                "Saved on this device but not yet synced: {}",
                record.last_error.as_deref().unwrap_or("unknown error")
            )
        });
        Ok(SaveOutcome { record, warning })
    }

    pub async fn status(&mut self) -> Result<StationStatus, ScanError> {
        if self.session.is_some() {
            match self.live_session().await {
                Ok(_) | Err(ScanError::SessionExpired) => {}
                Err(other) => return Err(other),
            }
        }
        Ok(StationStatus {
            phase: self.session.as_ref().map(VolunteerSession::phase),
            session: self.session.clone(),
            current: self.current.as_ref().map(Current::view),
            unsynced: self.recorder.pending_count().await?,
        })
    }

    pub async fn history(&mut self) -> Result<Vec<ScanRecord>, ScanError> {
        let session = self.live_session().await?;
        self.recorder.history(&session.session_id).await
    }

    /// Handle for a sync pass that runs without holding the station.
    pub fn recorder(&self) -> ScanRecorder {
        self.recorder.clone()
    }

    /// The session, if present and unexpired. An expired session is dropped
    /// together with any scan in progress.
    async fn live_session(&mut self) -> Result<VolunteerSession, ScanError> {
        let session = self.session.clone().ok_or(ScanError::NoSession)?;
        if let Err(err) = self.sessions.ensure_live(&session).await {
            if matches!(err, ScanError::SessionExpired) {
                self.session = None;
                self.current = None;
            }
            return Err(err);
        }
        Ok(session)
    }
}
