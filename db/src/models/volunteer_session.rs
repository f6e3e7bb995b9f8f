use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use serde::{Deserialize, Serialize};

/// A volunteer session persisted on this device so the operator can resume
/// after a reload without re-entering the gate code.
///
/// Keyed by event slug. The station keeps at most one row: storing a new
/// session discards whatever was there before.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "volunteer_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_slug: String,
    pub session_id: String,
    pub event_id: String,
    pub volunteer_name: String,
    pub volunteer_contact: Option<String>,
    /// JSON array of the check-in points granted with the session.
    pub venues: String,
    pub selected_location: Option<String>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Replaces any persisted session on this device with `session`.
    pub async fn store(db: &DatabaseConnection, session: Model) -> Result<Model, DbErr> {
        Entity::delete_many().exec(db).await?;
        session.into_active_model().insert(db).await
    }

    pub async fn find_by_event(
        db: &DatabaseConnection,
        event_slug: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(event_slug.to_owned()).one(db).await
    }

    pub async fn set_location(
        &self,
        db: &DatabaseConnection,
        location: &str,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.selected_location = Set(Some(location.to_owned()));
        active.update(db).await
    }

    /// Removes the persisted session for `event_slug`. Returns whether a row existed.
    pub async fn clear(db: &DatabaseConnection, event_slug: &str) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(event_slug.to_owned()).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub fn venue_list(&self) -> Vec<String> {
        serde_json::from_str(&self.venues).unwrap_or_default()
    }

    pub fn encode_venues(venues: &[String]) -> String {
        serde_json::to_string(venues).unwrap_or_else(|_| "[]".into())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
