//! Reservation repository interface

use async_trait::async_trait;

use super::model::{NewPayment, NewReservation, Payment, PaymentStatus, Reservation, ReservationStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Persist a reservation together with its counts, barcodes and initial
    /// payments as one atomic unit. Returns the stored reservation.
    async fn create(&self, reservation: NewReservation) -> DomainResult<Reservation>;

    /// Find reservation by ID, with counts and payments
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// Reservations booked by any of the given customers, newest first
    async fn find_by_customers(&self, customer_ids: &[i32]) -> DomainResult<Vec<Reservation>>;

    /// Compare-and-set the status. Returns `false` when the stored status
    /// was no longer `from`.
    async fn update_status(
        &self,
        id: i32,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool>;

    /// Record a payment attempt and store the re-derived payment status
    async fn append_payment(
        &self,
        id: i32,
        payment: NewPayment,
        payment_status: PaymentStatus,
    ) -> DomainResult<Payment>;
}
