//! Barcode repository interface
//!
//! Writers are guarded: every mutating call checks the barcode is still
//! PENDING as part of the same atomic unit that performs the write, so a
//! completion racing an extra-time charge resolves to exactly one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{BarcodeEntry, ExtraTimeCharge, ExtraTimeQuote, OutsideTrackEntry};
use crate::domain::DomainResult;

#[async_trait]
pub trait BarcodeRepository: Send + Sync {
    /// Find a barcode with its extra-time ledger and outside-tracker
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BarcodeEntry>>;

    /// All barcodes of a reservation, ordered by id
    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Vec<BarcodeEntry>>;

    /// Barcodes carrying the given ticket number (any status)
    async fn find_by_number(&self, barcode_number: &str) -> DomainResult<Vec<BarcodeEntry>>;

    /// Whether a PENDING barcode of a live reservation already uses this number
    async fn is_number_in_use(&self, barcode_number: &str) -> DomainResult<bool>;

    /// PENDING → COMPLETED. Returns `false` if it was already completed.
    async fn complete_if_pending(&self, id: i32, at: DateTime<Utc>) -> DomainResult<bool>;

    /// Append an extra-time charge; `BarcodeClosed` if the barcode is completed.
    async fn append_extra_time(
        &self,
        id: i32,
        quote: &ExtraTimeQuote,
        at: DateTime<Utc>,
    ) -> DomainResult<ExtraTimeCharge>;

    /// Open an outside-track entry; `AlreadyOutside` if one is open.
    async fn open_outside_track(&self, id: i32, at: DateTime<Utc>)
        -> DomainResult<OutsideTrackEntry>;

    /// Close the open outside-track entry; `NotOutside` if none is open.
    async fn close_outside_track(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<OutsideTrackEntry>;
}
