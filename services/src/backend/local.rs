use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::{
    EventBackend, GrantedSession, IssuedCode, LiveEventStats, PersonAttendance, RecentScan,
    RecordedScan,
};
use crate::access_code::{generate_code, normalize_code};
use crate::attendance::AttendanceStateReconciler;
use crate::error::ScanError;
use crate::qr_payload::RegistrationPayload;

const RECENT_SCANS: usize = 10;

#[derive(Debug, Clone)]
struct Grant {
    event_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Ledger {
    codes: HashMap<String, IssuedCode>,
    grants: HashMap<String, Grant>,
    /// Latest known payload per (event, registration).
    registrations: HashMap<(String, String), RegistrationPayload>,
    scans: Vec<(String, RecentScan)>,
}

/// In-process [`EventBackend`] for offline and development use.
///
/// Keeps codes, sessions and scans in memory. `set_offline(true)` makes every
/// call fail with [`ScanError::NetworkFailure`], which is how degraded paths
/// are exercised without a real network.
pub struct LocalBackend {
    code_ttl: Duration,
    session_ttl: chrono::Duration,
    venues: Vec<String>,
    offline: AtomicBool,
    next_scan: AtomicU64,
    ledger: RwLock<Ledger>,
}

impl LocalBackend {
    pub fn new(code_ttl: Duration, session_ttl: chrono::Duration, venues: Vec<String>) -> Self {
        Self {
            code_ttl,
            session_ttl,
            venues,
            offline: AtomicBool::new(false),
            next_scan: AtomicU64::new(1),
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Installs a known code for `event_id`, replacing the current one.
    pub async fn seed_access_code(&self, event_id: &str, code: &str) -> IssuedCode {
        let issued = IssuedCode {
            code: code.to_owned(),
            expires_at: Utc::now() + self.code_ttl_chrono(),
        };
        self.ledger
            .write()
            .await
            .codes
            .insert(event_id.to_owned(), issued.clone());
        issued
    }

    fn code_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.code_ttl).unwrap_or_else(|_| chrono::Duration::seconds(300))
    }

    fn ensure_online(&self) -> Result<(), ScanError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ScanError::NetworkFailure("local backend is offline".into()));
        }
        Ok(())
    }

    async fn rotate(&self, event_id: &str) -> Result<IssuedCode, ScanError> {
        self.ensure_online()?;
        let issued = IssuedCode {
            code: generate_code(),
            expires_at: Utc::now() + self.code_ttl_chrono(),
        };
        self.ledger
            .write()
            .await
            .codes
            .insert(event_id.to_owned(), issued.clone());
        Ok(issued)
    }
}

#[async_trait]
impl EventBackend for LocalBackend {
    async fn issue_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError> {
        self.rotate(event_id).await
    }

    async fn refresh_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError> {
        self.rotate(event_id).await
    }

    async fn validate_access_code(
        &self,
        event_slug: &str,
        code: &str,
        _volunteer_name: &str,
    ) -> Result<GrantedSession, ScanError> {
        self.ensure_online()?;
        let now = Utc::now();
        let mut ledger = self.ledger.write().await;

        let matches = normalize_code(code).is_some_and(|entered| {
            ledger
                .codes
                .get(event_slug)
                .filter(|c| now < c.expires_at)
                .is_some_and(|c| normalize_code(&c.code).as_deref() == Some(entered.as_str()))
        });
        if !matches {
            return Err(ScanError::InvalidCode);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let expires_at = now + self.session_ttl;
        ledger.grants.insert(
            session_id.clone(),
            Grant {
                event_id: event_slug.to_owned(),
                expires_at,
            },
        );

        Ok(GrantedSession {
            session_id,
            event_id: Some(event_slug.to_owned()),
            expires_at,
            venues: self.venues.clone(),
        })
    }

    async fn record_attendance_scan(
        &self,
        session_id: &str,
        location: &str,
        payload: &RegistrationPayload,
    ) -> Result<RecordedScan, ScanError> {
        self.ensure_online()?;
        let now = Utc::now();
        let n = self.next_scan.fetch_add(1, Ordering::SeqCst);
        let scan_id = format!("scan-{n:06}");

        let mut ledger = self.ledger.write().await;
        let event_id = ledger
            .grants
            .get(session_id)
            .map(|g| g.event_id.clone())
            .unwrap_or_else(|| payload.event_id().to_owned());

        ledger.registrations.insert(
            (event_id.clone(), payload.registration_id().to_owned()),
            payload.clone(),
        );
        ledger.scans.push((
            event_id,
            RecentScan {
                scan_id: scan_id.clone(),
                registration_id: payload.registration_id().to_owned(),
                location: location.to_owned(),
                present_count: AttendanceStateReconciler::present_count(payload) as u32,
                total_count: AttendanceStateReconciler::total_count(payload) as u32,
                timestamp: now,
            },
        ));

        Ok(RecordedScan {
            scan_id,
            timestamp: now,
        })
    }

    async fn get_live_event_stats(&self, event_id: &str) -> Result<LiveEventStats, ScanError> {
        self.ensure_online()?;
        let now = Utc::now();
        let ledger = self.ledger.read().await;

        let for_event = ledger
            .registrations
            .iter()
            .filter(|((event, _), _)| event == event_id)
            .map(|(_, payload)| payload);
        let (total_registrations, checked_in) = for_event.fold((0u64, 0u64), |(t, c), p| {
            (t + 1, c + AttendanceStateReconciler::present_count(p) as u64)
        });

        let active_volunteers = ledger
            .grants
            .values()
            .filter(|g| g.event_id == event_id && now < g.expires_at)
            .count() as u64;

        let recent_scans = ledger
            .scans
            .iter()
            .rev()
            .filter(|(event, _)| event == event_id)
            .take(RECENT_SCANS)
            .map(|(_, scan)| scan.clone())
            .collect();

        Ok(LiveEventStats {
            total_registrations,
            checked_in,
            active_volunteers,
            recent_scans,
        })
    }

    async fn fetch_registration_attendance(
        &self,
        event_id: &str,
        registration_id: &str,
    ) -> Result<Vec<PersonAttendance>, ScanError> {
        self.ensure_online()?;
        let ledger = self.ledger.read().await;
        let Some(payload) = ledger
            .registrations
            .get(&(event_id.to_owned(), registration_id.to_owned()))
        else {
            return Ok(Vec::new());
        };

        Ok(payload
            .persons()
            .into_iter()
            .map(|p| PersonAttendance {
                person_id: p.person_id.clone(),
                attendance_status: p.attendance_status,
                marked_at: p.marked_at,
                marked_by: p.marked_by.clone(),
            })
            .collect())
    }
}
