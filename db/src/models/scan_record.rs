use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Local, device-scoped history of "save attendance" actions.
///
/// Rows are written before the remote submission is attempted so nothing the
/// operator captured is lost if the network call fails or the process dies.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scan_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Local id until the backend assigns a canonical one on sync.
    pub scan_id: String,
    pub session_id: String,
    pub event_id: String,
    pub location: String,
    pub registration_id: String,
    /// JSON snapshot of the registration payload with its final statuses.
    pub snapshot: String,
    pub present_count: i32,
    pub total_count: i32,
    pub captured_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Sync state of a locally stored scan.
/// Backed by a `scan_sync_status` enum column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "scan_sync_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SyncStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "synced")]
    Synced,

    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to capture a new scan.
#[derive(Debug, Clone)]
pub struct NewScanRecord {
    pub scan_id: String,
    pub session_id: String,
    pub event_id: String,
    pub location: String,
    pub registration_id: String,
    pub snapshot: String,
    pub present_count: i32,
    pub total_count: i32,
    pub captured_at: DateTime<Utc>,
}

impl Model {
    /// Inserts a new scan in the `Pending` state.
    pub async fn create(db: &DatabaseConnection, new: NewScanRecord) -> Result<Model, DbErr> {
        ActiveModel {
            id: NotSet,
            scan_id: Set(new.scan_id),
            session_id: Set(new.session_id),
            event_id: Set(new.event_id),
            location: Set(new.location),
            registration_id: Set(new.registration_id),
            snapshot: Set(new.snapshot),
            present_count: Set(new.present_count),
            total_count: Set(new.total_count),
            captured_at: Set(new.captured_at),
            sync_status: Set(SyncStatus::Pending),
            synced_at: Set(None),
            last_error: Set(None),
        }
        .insert(db)
        .await
    }

    /// Adopts the server-assigned id and marks the scan as synced.
    pub async fn mark_synced(
        &self,
        db: &DatabaseConnection,
        server_scan_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.scan_id = Set(server_scan_id.to_owned());
        active.sync_status = Set(SyncStatus::Synced);
        active.synced_at = Set(Some(synced_at));
        active.last_error = Set(None);
        active.update(db).await
    }

    pub async fn mark_failed(&self, db: &DatabaseConnection, error: &str) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.sync_status = Set(SyncStatus::Failed);
        active.last_error = Set(Some(error.to_owned()));
        active.update(db).await
    }

    /// History for one volunteer session, newest first.
    pub async fn history_for_session(
        db: &DatabaseConnection,
        session_id: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::CapturedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// Every scan not yet accepted by the backend, oldest first.
    pub async fn unsynced(db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SyncStatus.is_in([SyncStatus::Pending, SyncStatus::Failed]))
            .order_by_asc(Column::CapturedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_with_status(
        db: &DatabaseConnection,
        status: SyncStatus,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SyncStatus.eq(status))
            .count(db)
            .await
    }
}
