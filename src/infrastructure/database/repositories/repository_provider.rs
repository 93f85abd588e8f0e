//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::barcode::BarcodeRepository;
use crate::domain::directory::{BranchDirectory, CustomerDirectory};
use crate::domain::rate::RateTable;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;

use super::barcode_repository::SeaOrmBarcodeRepository;
use super::directory_repository::{SeaOrmBranchDirectory, SeaOrmCustomerDirectory, SeaOrmRateTable};
use super::reservation_repository::SeaOrmReservationRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let barcode = repos.barcodes().find_by_id(7).await?;
/// let matches = repos.customers().find_by_mobile("5551234").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    reservations: SeaOrmReservationRepository,
    barcodes: SeaOrmBarcodeRepository,
    rates: SeaOrmRateTable,
    branches: SeaOrmBranchDirectory,
    customers: SeaOrmCustomerDirectory,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            reservations: SeaOrmReservationRepository::new(db.clone()),
            barcodes: SeaOrmBarcodeRepository::new(db.clone()),
            rates: SeaOrmRateTable::new(db.clone()),
            branches: SeaOrmBranchDirectory::new(db.clone()),
            customers: SeaOrmCustomerDirectory::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn barcodes(&self) -> &dyn BarcodeRepository {
        &self.barcodes
    }

    fn rates(&self) -> &dyn RateTable {
        &self.rates
    }

    fn branches(&self) -> &dyn BranchDirectory {
        &self.branches
    }

    fn customers(&self) -> &dyn CustomerDirectory {
        &self.customers
    }
}
