//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_directory;
mod m20240601_000002_create_reservations;
mod m20240601_000003_create_barcode_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_directory::Migration),
            Box::new(m20240601_000002_create_reservations::Migration),
            Box::new(m20240601_000003_create_barcode_entries::Migration),
        ]
    }
}
