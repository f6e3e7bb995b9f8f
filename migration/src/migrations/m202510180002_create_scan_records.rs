use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180002_create_scan_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("scan_records"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("scan_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("session_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("event_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("location")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("registration_id"))
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("snapshot")).text().not_null())
                    .col(
                        ColumnDef::new(Alias::new("present_count"))
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Alias::new("total_count"))
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Alias::new("captured_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("sync_status"))
                            .enumeration(
                                Alias::new("scan_sync_status"),
                                vec![
                                    Alias::new("pending"),
                                    Alias::new("synced"),
                                    Alias::new("failed"),
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Alias::new("synced_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("last_error")).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scan_records_session")
                    .table(Alias::new("scan_records"))
                    .col(Alias::new("session_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scan_records_sync_status")
                    .table(Alias::new("scan_records"))
                    .col(Alias::new("sync_status"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("scan_records")).to_owned())
            .await
    }
}
