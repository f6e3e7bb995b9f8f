//! Persists "save attendance" actions locally, then submits them.
//!
//! Local history is written first and the remote submission second, so a
//! network failure never loses what the operator captured: the record stays
//! in history as `failed` and can be resubmitted with
//! [`ScanRecorder::retry_unsynced`].

use chrono::{DateTime, Utc};
use db::models::scan_record::{Model as StoredScan, NewScanRecord, SyncStatus};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

use crate::attendance::AttendanceStateReconciler;
use crate::backend::EventBackend;
use crate::error::ScanError;
use crate::qr_payload::RegistrationPayload;
use crate::volunteer_session::VolunteerSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub session_id: String,
    pub event_id: String,
    pub location: String,
    pub registration_id: String,
    pub snapshot: RegistrationPayload,
    pub present_count: u32,
    pub total_count: u32,
    pub captured_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ScanRecord {
    pub fn is_synced(&self) -> bool {
        self.sync_status == SyncStatus::Synced
    }
}

impl TryFrom<StoredScan> for ScanRecord {
    type Error = ScanError;

    fn try_from(m: StoredScan) -> Result<Self, Self::Error> {
        let snapshot = serde_json::from_str(&m.snapshot).map_err(|e| {
            ScanError::Internal(format!("corrupt snapshot for scan {}: {e}", m.scan_id))
        })?;
        Ok(Self {
            scan_id: m.scan_id,
            session_id: m.session_id,
            event_id: m.event_id,
            location: m.location,
            registration_id: m.registration_id,
            snapshot,
            present_count: m.present_count.max(0) as u32,
            total_count: m.total_count.max(0) as u32,
            captured_at: m.captured_at,
            sync_status: m.sync_status,
            synced_at: m.synced_at,
            last_error: m.last_error,
        })
    }
}

/// Outcome of a manual sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ScanRecorder {
    db: DatabaseConnection,
    backend: Arc<dyn EventBackend>,
}

impl ScanRecorder {
    pub fn new(db: DatabaseConnection, backend: Arc<dyn EventBackend>) -> Self {
        Self { db, backend }
    }

    /// Stores a snapshot of `payload` and submits it to the backend.
    ///
    /// A failed submission is not an error: the returned record carries
    /// `sync_status = failed` and the reason in `last_error`. The write runs on
    /// its own task and completes even if the caller goes away.
    pub async fn save(
        &self,
        session: &VolunteerSession,
        location: &str,
        payload: &RegistrationPayload,
    ) -> Result<ScanRecord, ScanError> {
        let snapshot = serde_json::to_string(payload)
            .map_err(|e| ScanError::Internal(format!("failed to encode snapshot: {e}")))?;

        let new = NewScanRecord {
            scan_id: format!("local-{}", uuid::Uuid::new_v4()),
            session_id: session.session_id.clone(),
            event_id: session.event_id.clone(),
            location: location.to_owned(),
            registration_id: payload.registration_id().to_owned(),
            snapshot,
            present_count: AttendanceStateReconciler::present_count(payload) as i32,
            total_count: AttendanceStateReconciler::total_count(payload) as i32,
            captured_at: Utc::now(),
        };

        let recorder = self.clone();
        let payload = payload.clone();
        let stored = tokio::spawn(async move {
            let row = StoredScan::create(&recorder.db, new)
                .await
                .map_err(ScanError::from)?;
            recorder.submit(row, &payload).await
        })
        .await
        .map_err(|e| ScanError::Internal(format!("scan submission task failed: {e}")))??;

        ScanRecord::try_from(stored)
    }

    async fn submit(
        &self,
        row: StoredScan,
        payload: &RegistrationPayload,
    ) -> Result<StoredScan, ScanError> {
        match self
            .backend
            .record_attendance_scan(&row.session_id, &row.location, payload)
            .await
        {
            Ok(recorded) => {
                tracing::info!(
                    registration_id = %row.registration_id,
                    scan_id = %recorded.scan_id,
                    present = row.present_count,
                    total = row.total_count,
                    "attendance saved"
                );
                Ok(row
                    .mark_synced(&self.db, &recorded.scan_id, recorded.timestamp)
                    .await?)
            }
            Err(err) => {
                tracing::warn!(
                    registration_id = %row.registration_id,
                    local_scan_id = %row.scan_id,
                    error = %err,
                    "attendance kept locally; submission failed"
                );
                Ok(row.mark_failed(&self.db, &err.to_string()).await?)
            }
        }
    }

    /// Local history for one session, newest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ScanRecord>, ScanError> {
        StoredScan::history_for_session(&self.db, session_id)
            .await?
            .into_iter()
            .map(ScanRecord::try_from)
            .collect()
    }

    /// Resubmits every pending or failed record, oldest first.
    pub async fn retry_unsynced(&self) -> Result<SyncReport, ScanError> {
        let mut report = SyncReport::default();

        for row in StoredScan::unsynced(&self.db).await? {
            report.attempted += 1;
            let payload: RegistrationPayload = match serde_json::from_str(&row.snapshot) {
                Ok(p) => p,
                Err(e) => {
                    row.mark_failed(&self.db, &format!("corrupt snapshot: {e}"))
                        .await?;
                    report.failed += 1;
                    continue;
                }
            };

            let updated = self.submit(row, &payload).await?;
            if updated.sync_status == SyncStatus::Synced {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                "sync pass finished"
            );
        }
        Ok(report)
    }

    pub async fn pending_count(&self) -> Result<u64, ScanError> {
        let pending = StoredScan::count_with_status(&self.db, SyncStatus::Pending).await?;
        let failed = StoredScan::count_with_status(&self.db, SyncStatus::Failed).await?;
        Ok(pending + failed)
    }
}
