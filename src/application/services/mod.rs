//! Application services
//!
//! One service per engine concern. All of them share the repository
//! provider, the clock, the event bus and the status synchroniser.

pub mod confirmation;
pub mod extra_time;
pub mod outside_tracking;
pub mod payment_ledger;
pub mod reservation;
pub mod scan;
pub mod status_sync;

pub use confirmation::BarcodeConfirmationService;
pub use extra_time::{ExtraTimeReceipt, ExtraTimeService};
pub use outside_tracking::OutsideTrackingService;
pub use payment_ledger::{PaymentLedgerService, RecordPayment};
pub use reservation::{CreateReservation, CustomerTypeLine, InitialPayment, ReservationService};
pub use scan::{ScanOutcome, ScanService};
pub use status_sync::StatusSynchronizer;

use crate::domain::reservation::project_status;
use crate::domain::{
    BarcodeEntry, DomainError, DomainResult, RepositoryProvider, Reservation, ReservationDetail,
};

/// Assemble the display view of a reservation. The status is re-derived
/// from the barcodes on read.
pub(crate) async fn load_detail(
    repos: &dyn RepositoryProvider,
    mut reservation: Reservation,
) -> DomainResult<ReservationDetail> {
    let barcodes = repos.barcodes().find_by_reservation(reservation.id).await?;
    let customer = repos.customers().find_by_id(reservation.customer_id).await?;
    reservation.status = project_status(reservation.status, &barcodes);
    Ok(ReservationDetail {
        reservation,
        customer,
        barcodes,
    })
}

pub(crate) async fn require_reservation(
    repos: &dyn RepositoryProvider,
    id: i32,
) -> DomainResult<Reservation> {
    repos
        .reservations()
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
}

pub(crate) async fn require_barcode(
    repos: &dyn RepositoryProvider,
    id: i32,
) -> DomainResult<BarcodeEntry> {
    repos
        .barcodes()
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("BarcodeEntry", "id", id))
}

/// Load a barcode and its reservation for a write. A cancelled
/// reservation's barcodes are frozen.
pub(crate) async fn load_for_write(
    repos: &dyn RepositoryProvider,
    barcode_id: i32,
) -> DomainResult<(BarcodeEntry, Reservation)> {
    let barcode = require_barcode(repos, barcode_id).await?;
    let reservation = require_reservation(repos, barcode.reservation_id).await?;
    reservation.ensure_not_cancelled()?;
    Ok((barcode, reservation))
}
