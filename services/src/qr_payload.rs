//! Registration payloads carried in attendee QR codes.
//!
//! A QR code holds a small JSON document describing one registration:
//!
//! ```json
//! { "type": "individual", "event_id": "hackathon-2025", "registration_id": "REG-17",
//!   "person": { "person_id": "P-1", "name": "Ada", "enrollment_id": "u2101", "department": "CS" } }
//!
//! { "type": "team", "event_id": "hackathon-2025", "registration_id": "REG-18",
//!   "team_name": "Null Pointers",
//!   "leader":  { "person_id": "P-2", "name": "Lin" },
//!   "members": [ { "person_id": "P-3", "name": "Sam" } ] }
//! ```
//!
//! Decoding is pure. Live attendance (marks made by other volunteers) is fetched
//! separately and merged by [`crate::attendance::AttendanceStateReconciler`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: String,
    pub name: String,
    pub enrollment_or_employee_id: String,
    pub department: String,
    #[serde(default)]
    pub attendance_status: AttendanceStatus,
    #[serde(default)]
    pub marked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub marked_by: Option<String>,
}

impl Person {
    pub fn is_present(&self) -> bool {
        self.attendance_status == AttendanceStatus::Present
    }
}

/// One decoded registration, individual or team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrationPayload {
    Individual {
        event_id: String,
        registration_id: String,
        person: Person,
    },
    Team {
        event_id: String,
        registration_id: String,
        team_name: String,
        leader: Person,
        members: Vec<Person>,
    },
}

impl RegistrationPayload {
    pub fn event_id(&self) -> &str {
        match self {
            RegistrationPayload::Individual { event_id, .. }
            | RegistrationPayload::Team { event_id, .. } => event_id,
        }
    }

    pub fn registration_id(&self) -> &str {
        match self {
            RegistrationPayload::Individual {
                registration_id, ..
            }
            | RegistrationPayload::Team {
                registration_id, ..
            } => registration_id,
        }
    }

    /// Every person on the registration, leader first for teams.
    pub fn persons(&self) -> Vec<&Person> {
        match self {
            RegistrationPayload::Individual { person, .. } => vec![person],
            RegistrationPayload::Team {
                leader, members, ..
            } => std::iter::once(leader).chain(members.iter()).collect(),
        }
    }

    pub(crate) fn persons_mut(&mut self) -> Vec<&mut Person> {
        match self {
            RegistrationPayload::Individual { person, .. } => vec![person],
            RegistrationPayload::Team {
                leader, members, ..
            } => std::iter::once(leader).chain(members.iter_mut()).collect(),
        }
    }

    pub fn person(&self, person_id: &str) -> Option<&Person> {
        self.persons().into_iter().find(|p| p.person_id == person_id)
    }
}

// --- wire shapes ---

/// Ids may be printed as strings or bare numbers depending on who generated the QR.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s.trim().to_owned(),
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "type")]
    kind: Option<String>,
    event_id: Option<RawId>,
    registration_id: Option<RawId>,
    person: Option<RawPerson>,
    team_name: Option<String>,
    leader: Option<RawPerson>,
    members: Option<Vec<RawPerson>>,
}

#[derive(Deserialize)]
struct RawPerson {
    person_id: Option<RawId>,
    name: Option<String>,
    #[serde(alias = "enrollment_id", alias = "employee_id")]
    enrollment_or_employee_id: Option<RawId>,
    department: Option<String>,
}

fn malformed(reason: impl Into<String>) -> ScanError {
    ScanError::MalformedPayload(reason.into())
}

fn required_id(value: Option<RawId>, field: &str) -> Result<String, ScanError> {
    value
        .map(RawId::into_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed(format!("missing {field}")))
}

impl RawPerson {
    fn into_person(self, role: &str) -> Result<Person, ScanError> {
        let person_id = required_id(self.person_id, &format!("{role}.person_id"))?;
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| malformed(format!("missing {role}.name")))?;

        Ok(Person {
            person_id,
            name,
            enrollment_or_employee_id: self
                .enrollment_or_employee_id
                .map(RawId::into_string)
                .unwrap_or_default(),
            department: self.department.map(|d| d.trim().to_owned()).unwrap_or_default(),
            attendance_status: AttendanceStatus::Pending,
            marked_at: None,
            marked_by: None,
        })
    }
}

/// Parses scanned QR text into a [`RegistrationPayload`].
pub struct QrPayloadDecoder;

impl QrPayloadDecoder {
    /// Decodes `raw` into a payload with every person `Pending`.
    ///
    /// Fails with [`ScanError::MalformedPayload`] when the text is not JSON,
    /// `event_id`/`registration_id` are missing, `type` is not `individual` or
    /// `team`, a team has no leader, or two people share a `person_id`.
    pub fn decode(raw: &str) -> Result<RegistrationPayload, ScanError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(malformed("empty scan"));
        }

        let parsed: RawPayload =
            serde_json::from_str(raw).map_err(|e| malformed(format!("not a registration code ({e})")))?;

        let kind = parsed
            .kind
            .map(|k| k.trim().to_ascii_lowercase())
            .ok_or_else(|| malformed("missing type"))?;
        let event_id = required_id(parsed.event_id, "event_id")?;
        let registration_id = required_id(parsed.registration_id, "registration_id")?;

        let payload = match kind.as_str() {
            "individual" => {
                let person = parsed
                    .person
                    .ok_or_else(|| malformed("missing person"))?
                    .into_person("person")?;
                RegistrationPayload::Individual {
                    event_id,
                    registration_id,
                    person,
                }
            }
            "team" => {
                let leader = parsed
                    .leader
                    .ok_or_else(|| malformed("team registration without leader"))?
                    .into_person("leader")?;
                let members = parsed
                    .members
                    .unwrap_or_default()
                    .into_iter()
                    .map(|m| m.into_person("member"))
                    .collect::<Result<Vec<_>, _>>()?;
                RegistrationPayload::Team {
                    event_id,
                    registration_id,
                    team_name: parsed.team_name.map(|t| t.trim().to_owned()).unwrap_or_default(),
                    leader,
                    members,
                }
            }
            other => return Err(malformed(format!("unknown registration type '{other}'"))),
        };

        let mut seen = HashSet::new();
        for p in payload.persons() {
            if !seen.insert(p.person_id.as_str()) {
                return Err(malformed(format!("duplicate person_id '{}'", p.person_id)));
            }
        }

        Ok(payload)
    }
}
