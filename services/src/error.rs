//! Error taxonomy for the check-in pipeline.
//!
//! Variants fall into three groups, and callers are expected to treat them
//! differently:
//!
//! - correctable input (`InvalidCode`, `InvalidIdentity`, `InvalidLocation`,
//!   `MalformedPayload`, `PersonNotFound`): shown to the operator, the flow
//!   keeps accepting input;
//! - session loss (`SessionExpired`, `NoSession`): the operator goes back to
//!   code entry;
//! - infrastructure (`NetworkFailure`, `Database`, `Internal`).

use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid or expired access code")]
    InvalidCode,

    #[error("Volunteer name is required")]
    InvalidIdentity,

    #[error("Volunteer session has expired")]
    SessionExpired,

    #[error("No volunteer session found")]
    NoSession,

    #[error("'{0}' is not a check-in point for this event")]
    InvalidLocation(String),

    #[error("Select a check-in location before scanning")]
    LocationNotSelected,

    #[error("Malformed QR payload: {0}")]
    MalformedPayload(String),

    #[error("No registration is currently being scanned")]
    NoActiveScan,

    #[error("Person '{0}' is not part of this registration")]
    PersonNotFound(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// True when the operator must go back to code entry.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ScanError::SessionExpired | ScanError::NoSession)
    }

    /// True for input problems the operator can fix and retry immediately.
    pub fn is_correctable(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidCode
                | ScanError::InvalidIdentity
                | ScanError::InvalidLocation(_)
                | ScanError::LocationNotSelected
                | ScanError::MalformedPayload(_)
                | ScanError::PersonNotFound(_)
        )
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::NetworkFailure(err.to_string())
    }
}
