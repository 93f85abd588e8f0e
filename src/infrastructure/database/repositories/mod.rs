//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod barcode_repository;
pub mod directory_repository;
pub mod repository_provider;
pub mod reservation_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

fn corrupt(entity: &str, field: &str, value: &str) -> DomainError {
    DomainError::Storage(format!("{} has unknown {} '{}'", entity, field, value))
}
