//! Reservation domain entity
//!
//! The booking aggregate. Its presence status (WENT_OUTSIDE / BACK_INSIDE)
//! and its completion are projections over the owned barcode entries and are
//! recomputed by [`project_status`] rather than written independently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::barcode::{BarcodeEntry, NewBarcodeEntry};
use crate::domain::directory::Customer;
use crate::domain::{DomainError, DomainResult};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    PendingPayment,
    Confirmed,
    WentOutside,
    BackInside,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::WentOutside => "WENT_OUTSIDE",
            Self::BackInside => "BACK_INSIDE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING_PAYMENT" => Some(Self::PendingPayment),
            "CONFIRMED" => Some(Self::Confirmed),
            "WENT_OUTSIDE" => Some(Self::WentOutside),
            "BACK_INSIDE" => Some(Self::BackInside),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Guests are admitted and may be found by a scan
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Confirmed | Self::WentOutside | Self::BackInside)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Derive the status from the payment records: PAID once settled
    /// amounts cover the price, FAILED while nothing is settled and the
    /// latest attempt failed, PENDING otherwise.
    pub fn derive(total_price: Decimal, payments: &[Payment]) -> Self {
        let settled = settled_total(payments);
        if settled > Decimal::ZERO && settled >= total_price {
            return Self::Paid;
        }
        if settled.is_zero() && payments.last().map(|p| p.status) == Some(PaymentRecordStatus::Failed)
        {
            return Self::Failed;
        }
        Self::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one payment attempt, as reported by the payment ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRecordStatus {
    Settled,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settled => "SETTLED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SETTLED" => Some(Self::Settled),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: i32,
    pub reservation_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentRecordStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentRecordStatus,
    pub recorded_at: DateTime<Utc>,
}

fn settled_total(payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.status == PaymentRecordStatus::Settled)
        .map(|p| p.amount)
        .sum()
}

/// How many guests of one customer type were booked, and at which rate
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTypeCount {
    pub id: i32,
    pub customer_type_id: i32,
    pub rate_row_id: i32,
    pub count: i32,
    pub unit_price: Decimal,
    pub duration_minutes: i32,
}

impl CustomerTypeCount {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomerTypeCount {
    pub customer_type_id: i32,
    pub rate_row_id: i32,
    pub count: i32,
    pub unit_price: Decimal,
    pub duration_minutes: i32,
}

/// Booking aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub branch_id: i32,
    pub customer_id: i32,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    /// Fixed at creation: Σ count × rate price
    pub total_price: Decimal,
    pub created_date: DateTime<Utc>,
    pub counts: Vec<CustomerTypeCount>,
    pub payments: Vec<Payment>,
}

impl Reservation {
    /// Sum of settled payments
    pub fn total_payment(&self) -> Decimal {
        settled_total(&self.payments)
    }

    pub fn balance_due(&self) -> Decimal {
        (self.total_price - self.total_payment()).max(Decimal::ZERO)
    }

    pub fn guest_count(&self) -> i32 {
        self.counts.iter().map(|c| c.count).sum()
    }

    /// PENDING_PAYMENT → CONFIRMED, once payment is captured
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != ReservationStatus::PendingPayment {
            return Err(DomainError::State(format!(
                "reservation {} cannot be confirmed from {}",
                self.id, self.status
            )));
        }
        if self.payment_status != PaymentStatus::Paid {
            return Err(DomainError::State(format!(
                "reservation {} cannot be confirmed while payment is {}",
                self.id, self.payment_status
            )));
        }
        self.status = ReservationStatus::Confirmed;
        Ok(())
    }

    /// Cancellation is allowed before anyone has left the venue or finished
    /// their session. Histories are kept as they are.
    pub fn cancel(&mut self, barcodes: &[BarcodeEntry]) -> DomainResult<()> {
        if !matches!(
            self.status,
            ReservationStatus::PendingPayment | ReservationStatus::Confirmed
        ) {
            return Err(DomainError::State(format!(
                "reservation {} cannot be cancelled from {}",
                self.id, self.status
            )));
        }
        if barcodes.iter().any(|b| b.is_completed()) {
            return Err(DomainError::State(format!(
                "reservation {} has completed barcodes",
                self.id
            )));
        }
        if barcodes.iter().any(|b| b.is_outside()) {
            return Err(DomainError::State(format!(
                "reservation {} has guests outside",
                self.id
            )));
        }
        self.status = ReservationStatus::Cancelled;
        Ok(())
    }

    /// Explicit request to finish the reservation. Returns `false` when it
    /// already was completed.
    pub fn complete(&mut self, barcodes: &[BarcodeEntry]) -> DomainResult<bool> {
        match self.status {
            ReservationStatus::Completed => return Ok(false),
            ReservationStatus::Cancelled => {
                return Err(DomainError::State(format!(
                    "reservation {} is cancelled",
                    self.id
                )))
            }
            _ => {}
        }
        if !all_completed(barcodes) {
            return Err(DomainError::State(format!(
                "reservation {} still has barcodes in progress",
                self.id
            )));
        }
        self.status = ReservationStatus::Completed;
        Ok(true)
    }

    /// Mutations on a cancelled reservation's barcodes are frozen
    pub fn ensure_not_cancelled(&self) -> DomainResult<()> {
        if self.status == ReservationStatus::Cancelled {
            return Err(DomainError::State(format!(
                "reservation {} is cancelled",
                self.id
            )));
        }
        Ok(())
    }
}

fn all_completed(barcodes: &[BarcodeEntry]) -> bool {
    !barcodes.is_empty() && barcodes.iter().all(|b| b.is_completed())
}

/// Reservation status as a function of the current barcode set.
///
/// - terminal states stay as they are;
/// - every barcode completed → COMPLETED;
/// - PENDING_PAYMENT otherwise stays until payment confirmation;
/// - an admitted reservation is WENT_OUTSIDE while any pending barcode has an
///   open outside entry, BACK_INSIDE once such entries exist but are all
///   closed, CONFIRMED if nobody ever left.
pub fn project_status(current: ReservationStatus, barcodes: &[BarcodeEntry]) -> ReservationStatus {
    if current.is_terminal() {
        return current;
    }
    if all_completed(barcodes) {
        return ReservationStatus::Completed;
    }
    if current == ReservationStatus::PendingPayment {
        return current;
    }

    let pending = barcodes.iter().filter(|b| !b.is_completed());
    let mut went_out = false;
    for barcode in pending {
        if barcode.is_outside() {
            return ReservationStatus::WentOutside;
        }
        went_out |= !barcode.outside_tracks.is_empty();
    }
    if went_out {
        ReservationStatus::BackInside
    } else {
        ReservationStatus::Confirmed
    }
}

/// Latest end time among the barcodes; `None` for a cancelled reservation.
pub fn reservation_end_time(
    status: ReservationStatus,
    barcodes: &[BarcodeEntry],
) -> Option<DateTime<Utc>> {
    if status == ReservationStatus::Cancelled {
        return None;
    }
    barcodes.iter().map(|b| b.end_time()).max()
}

/// Everything needed to persist a booking in one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub branch_id: i32,
    pub customer_id: i32,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Decimal,
    pub created_date: DateTime<Utc>,
    pub counts: Vec<NewCustomerTypeCount>,
    pub barcodes: Vec<NewBarcodeEntry>,
    pub payments: Vec<NewPayment>,
    /// Prefix for generated barcode numbers
    pub barcode_prefix: String,
}

/// Reservation with its barcodes and customer, for display
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetail {
    pub reservation: Reservation,
    pub customer: Option<Customer>,
    pub barcodes: Vec<BarcodeEntry>,
}

impl ReservationDetail {
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        reservation_end_time(self.reservation.status, &self.barcodes)
    }

    pub fn total_extra_charges(&self) -> Decimal {
        self.barcodes.iter().map(|b| b.total_extra_charges()).sum()
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::barcode::{BarcodeStatus, OutsideTrackEntry};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn barcode(id: i32, minutes: i32) -> BarcodeEntry {
        BarcodeEntry {
            id,
            reservation_id: 1,
            barcode_number: format!("B{}", id),
            customer_type_id: 1,
            initial_minutes: minutes,
            status: BarcodeStatus::Pending,
            created_at: t0(),
            completed_at: None,
            extra_time: vec![],
            outside_tracks: vec![],
        }
    }

    fn sample_reservation(status: ReservationStatus, payment_status: PaymentStatus) -> Reservation {
        Reservation {
            id: 1,
            branch_id: 1,
            customer_id: 1,
            status,
            payment_status,
            total_price: Decimal::from(50),
            created_date: t0(),
            counts: vec![],
            payments: vec![],
        }
    }

    fn payment(amount: i64, status: PaymentRecordStatus) -> Payment {
        Payment {
            id: 1,
            reservation_id: 1,
            amount: Decimal::from(amount),
            method: "card".into(),
            status,
            recorded_at: t0(),
        }
    }

    #[test]
    fn status_roundtrip() {
        for s in [
            ReservationStatus::PendingPayment,
            ReservationStatus::Confirmed,
            ReservationStatus::WentOutside,
            ReservationStatus::BackInside,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(ReservationStatus::from_str("nope"), None);
    }

    #[test]
    fn confirm_requires_paid() {
        let mut r = sample_reservation(ReservationStatus::PendingPayment, PaymentStatus::Pending);
        assert!(matches!(r.confirm(), Err(DomainError::State(_))));
        assert_eq!(r.status, ReservationStatus::PendingPayment);

        r.payment_status = PaymentStatus::Paid;
        r.confirm().unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert!(matches!(r.confirm(), Err(DomainError::State(_))));
    }

    #[test]
    fn cancel_only_from_pending_or_confirmed() {
        let mut r = sample_reservation(ReservationStatus::Confirmed, PaymentStatus::Paid);
        r.cancel(&[barcode(1, 60)]).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);

        let mut outside = sample_reservation(ReservationStatus::WentOutside, PaymentStatus::Paid);
        assert!(matches!(outside.cancel(&[]), Err(DomainError::State(_))));
        assert_eq!(outside.status, ReservationStatus::WentOutside);
    }

    #[test]
    fn cancel_rejected_with_completed_barcode() {
        let mut r = sample_reservation(ReservationStatus::Confirmed, PaymentStatus::Paid);
        let mut b = barcode(1, 60);
        b.complete(t0());
        assert!(matches!(r.cancel(&[b]), Err(DomainError::State(_))));
        assert_eq!(r.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn complete_requires_all_barcodes_completed() {
        let mut r = sample_reservation(ReservationStatus::Confirmed, PaymentStatus::Paid);
        let mut done = barcode(1, 60);
        done.complete(t0());
        let open = barcode(2, 60);

        assert!(matches!(
            r.complete(&[done.clone(), open]),
            Err(DomainError::State(_))
        ));
        assert_eq!(r.status, ReservationStatus::Confirmed);

        assert!(r.complete(&[done.clone()]).unwrap());
        assert!(!r.complete(&[done]).unwrap());
    }

    #[test]
    fn complete_rejects_empty_reservation() {
        let mut r = sample_reservation(ReservationStatus::Confirmed, PaymentStatus::Paid);
        assert!(matches!(r.complete(&[]), Err(DomainError::State(_))));
    }

    #[test]
    fn projection_tracks_outside_movement() {
        let mut a = barcode(1, 60);
        let b = barcode(2, 60);
        let confirmed = ReservationStatus::Confirmed;

        assert_eq!(project_status(confirmed, &[a.clone(), b.clone()]), confirmed);

        a.outside_tracks.push(OutsideTrackEntry {
            id: 1,
            barcode_id: 1,
            out_at: t0(),
            in_at: None,
        });
        assert_eq!(
            project_status(confirmed, &[a.clone(), b.clone()]),
            ReservationStatus::WentOutside
        );

        a.outside_tracks[0].in_at = Some(t0() + Duration::minutes(10));
        assert_eq!(
            project_status(ReservationStatus::WentOutside, &[a, b]),
            ReservationStatus::BackInside
        );
    }

    #[test]
    fn projection_completes_when_every_barcode_completed() {
        let mut a = barcode(1, 60);
        let mut b = barcode(2, 60);
        a.complete(t0());
        assert_eq!(
            project_status(ReservationStatus::Confirmed, &[a.clone(), b.clone()]),
            ReservationStatus::Confirmed
        );
        b.complete(t0());
        assert_eq!(
            project_status(ReservationStatus::BackInside, &[a.clone(), b.clone()]),
            ReservationStatus::Completed
        );
        assert_eq!(
            project_status(ReservationStatus::Cancelled, &[a, b]),
            ReservationStatus::Cancelled
        );
    }

    #[test]
    fn projection_keeps_pending_payment() {
        let mut a = barcode(1, 60);
        a.outside_tracks.push(OutsideTrackEntry {
            id: 1,
            barcode_id: 1,
            out_at: t0(),
            in_at: None,
        });
        assert_eq!(
            project_status(ReservationStatus::PendingPayment, &[a]),
            ReservationStatus::PendingPayment
        );
    }

    #[test]
    fn projection_ignores_open_tracks_of_completed_barcodes() {
        let mut a = barcode(1, 60);
        a.outside_tracks.push(OutsideTrackEntry {
            id: 1,
            barcode_id: 1,
            out_at: t0(),
            in_at: None,
        });
        a.complete(t0());
        let b = barcode(2, 60);
        assert_eq!(
            project_status(ReservationStatus::WentOutside, &[a, b]),
            ReservationStatus::Confirmed
        );
    }

    #[test]
    fn end_time_is_latest_barcode() {
        let a = barcode(1, 60);
        let b = barcode(2, 90);
        assert_eq!(
            reservation_end_time(ReservationStatus::Confirmed, &[a.clone(), b.clone()]),
            Some(t0() + Duration::minutes(90))
        );
        assert_eq!(reservation_end_time(ReservationStatus::Cancelled, &[a, b]), None);
    }

    #[test]
    fn payment_status_derivation() {
        let total = Decimal::from(50);
        assert_eq!(PaymentStatus::derive(total, &[]), PaymentStatus::Pending);
        assert_eq!(
            PaymentStatus::derive(total, &[payment(50, PaymentRecordStatus::Failed)]),
            PaymentStatus::Failed
        );
        assert_eq!(
            PaymentStatus::derive(total, &[payment(20, PaymentRecordStatus::Settled)]),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::derive(
                total,
                &[
                    payment(20, PaymentRecordStatus::Settled),
                    payment(30, PaymentRecordStatus::Settled)
                ]
            ),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn totals_are_projections_of_payments() {
        let mut r = sample_reservation(ReservationStatus::PendingPayment, PaymentStatus::Pending);
        r.payments = vec![
            payment(20, PaymentRecordStatus::Settled),
            payment(99, PaymentRecordStatus::Failed),
        ];
        assert_eq!(r.total_payment(), Decimal::from(20));
        assert_eq!(r.balance_due(), Decimal::from(30));
    }
}
