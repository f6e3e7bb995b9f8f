use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180001_create_volunteer_sessions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("volunteer_sessions"))
                    .if_not_exists()
                    // one persisted session per event on this device
                    .col(
                        ColumnDef::new(Alias::new("event_slug"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("session_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("event_id")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("volunteer_name"))
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("volunteer_contact"))
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("venues"))
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Alias::new("selected_location"))
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("granted_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("expires_at"))
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("volunteer_sessions"))
                    .to_owned(),
            )
            .await
    }
}
