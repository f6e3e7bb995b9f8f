use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510180001_create_volunteer_sessions::Migration),
            Box::new(migrations::m202510180002_create_scan_records::Migration),
        ]
    }
}
