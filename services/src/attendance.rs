use chrono::{DateTime, Utc};

use crate::backend::PersonAttendance;
use crate::error::ScanError;
use crate::qr_payload::{AttendanceStatus, RegistrationPayload};

/// Owns every mutation of attendance fields on a decoded registration.
///
/// All operations take a payload by reference and return a new one, so the
/// reconciler itself holds no state between records.
pub struct AttendanceStateReconciler;

impl AttendanceStateReconciler {
    /// Flips one person between `Pending` and `Present`.
    ///
    /// Marking present stamps `marked_at`/`marked_by`; marking pending clears
    /// both, so toggling twice yields the original payload.
    pub fn toggle(
        payload: &RegistrationPayload,
        person_id: &str,
        volunteer: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPayload, ScanError> {
        let mut next = payload.clone();
        let person = next
            .persons_mut()
            .into_iter()
            .find(|p| p.person_id == person_id)
            .ok_or_else(|| ScanError::PersonNotFound(person_id.to_owned()))?;

        match person.attendance_status {
            AttendanceStatus::Pending => {
                person.attendance_status = AttendanceStatus::Present;
                person.marked_at = Some(now);
                person.marked_by = Some(volunteer.to_owned());
            }
            AttendanceStatus::Present => {
                person.attendance_status = AttendanceStatus::Pending;
                person.marked_at = None;
                person.marked_by = None;
            }
        }

        Ok(next)
    }

    pub fn present_count(payload: &RegistrationPayload) -> usize {
        payload.persons().iter().filter(|p| p.is_present()).count()
    }

    pub fn total_count(payload: &RegistrationPayload) -> usize {
        match payload {
            RegistrationPayload::Individual { .. } => 1,
            RegistrationPayload::Team { members, .. } => 1 + members.len(),
        }
    }

    /// Overlays marks already recorded by other volunteers.
    ///
    /// Entries for unknown person ids are ignored; people without an entry
    /// keep their current state.
    pub fn merge_live_status(
        payload: &RegistrationPayload,
        live: &[PersonAttendance],
    ) -> RegistrationPayload {
        let mut next = payload.clone();
        for person in next.persons_mut() {
            let Some(entry) = live.iter().find(|l| l.person_id == person.person_id) else {
                continue;
            };
            person.attendance_status = entry.attendance_status;
            match entry.attendance_status {
                AttendanceStatus::Present => {
                    person.marked_at = entry.marked_at;
                    person.marked_by = entry.marked_by.clone();
                }
                AttendanceStatus::Pending => {
                    person.marked_at = None;
                    person.marked_by = None;
                }
            }
        }
        next
    }
}
