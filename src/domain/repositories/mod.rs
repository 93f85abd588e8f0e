//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::barcode::BarcodeRepository;
use super::directory::{BranchDirectory, CustomerDirectory};
use super::rate::RateTable;
use super::reservation::ReservationRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let barcode = repos.barcodes().find_by_id(7).await?;
///     let rate = repos.rates().get_rate(1, 2, Some(30)).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn reservations(&self) -> &dyn ReservationRepository;
    fn barcodes(&self) -> &dyn BarcodeRepository;
    fn rates(&self) -> &dyn RateTable;
    fn branches(&self) -> &dyn BranchDirectory;
    fn customers(&self) -> &dyn CustomerDirectory;
}
