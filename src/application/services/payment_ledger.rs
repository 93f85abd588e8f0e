//! Payment ledger adapter
//!
//! Records settled or failed payment attempts reported by the external
//! payment flow. `payment_status` is re-derived from the records on every
//! append; totals are never stored.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::reservation::validate_payment;
use super::{load_detail, require_reservation, StatusSynchronizer};
use crate::domain::reservation::{NewPayment, Payment, PaymentRecordStatus};
use crate::domain::{
    DomainError, DomainResult, PaymentStatus, RepositoryProvider, ReservationDetail,
    ReservationStatus,
};
use crate::shared::SharedClock;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPayment {
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentRecordStatus,
}

pub struct PaymentLedgerService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    status: StatusSynchronizer,
}

impl PaymentLedgerService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        status: StatusSynchronizer,
    ) -> Self {
        Self {
            repos,
            clock,
            status,
        }
    }

    pub async fn record(
        &self,
        reservation_id: i32,
        request: RecordPayment,
    ) -> DomainResult<ReservationDetail> {
        validate_payment(request.amount, &request.method)?;

        let guard = self.status.lock(reservation_id).await;
        let reservation = require_reservation(self.repos.as_ref(), reservation_id).await?;
        if reservation.status == ReservationStatus::Cancelled {
            return Err(DomainError::State(format!(
                "reservation {} is cancelled",
                reservation_id
            )));
        }

        let payment = NewPayment {
            amount: request.amount,
            method: request.method.trim().to_string(),
            status: request.status,
            recorded_at: self.clock.now(),
        };
        let mut projected: Vec<Payment> = reservation.payments.clone();
        projected.push(Payment {
            id: 0,
            reservation_id,
            amount: payment.amount,
            method: payment.method.clone(),
            status: payment.status,
            recorded_at: payment.recorded_at,
        });
        let payment_status = PaymentStatus::derive(reservation.total_price, &projected);

        let stored = self
            .repos
            .reservations()
            .append_payment(reservation_id, payment, payment_status)
            .await?;
        drop(guard);

        info!(
            reservation_id,
            payment_id = stored.id,
            amount = %stored.amount,
            method = %stored.method,
            record_status = stored.status.as_str(),
            payment_status = %payment_status,
            "Payment recorded"
        );
        metrics::counter!("payments_recorded_total", "status" => stored.status.as_str()).increment(1);

        let reservation = require_reservation(self.repos.as_ref(), reservation_id).await?;
        load_detail(self.repos.as_ref(), reservation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::*;
    use crate::application::services::{CreateReservation, CustomerTypeLine};

    fn settled(amount: i64) -> RecordPayment {
        RecordPayment {
            amount: Decimal::from(amount),
            method: "card".into(),
            status: PaymentRecordStatus::Settled,
        }
    }

    async fn unpaid_id(engine: &crate::application::engine::SessionEngine) -> i32 {
        engine
            .create_reservation(CreateReservation {
                branch_id: BRANCH,
                customer_id: CUSTOMER,
                lines: vec![CustomerTypeLine {
                    customer_type_id: ADULT,
                    count: 2,
                    rate_row_id: ADULT_60,
                    barcode_numbers: vec![],
                }],
                payment: None,
            })
            .await
            .unwrap()
            .reservation
            .id
    }

    #[tokio::test]
    async fn settled_payments_accumulate_to_paid() {
        let (engine, _clock) = engine_at(t(13, 0));
        let id = unpaid_id(&engine).await;

        let partial = engine.record_payment(id, settled(15)).await.unwrap();
        assert_eq!(partial.reservation.payment_status, PaymentStatus::Pending);
        assert_eq!(partial.reservation.balance_due(), Decimal::from(25));

        let full = engine.record_payment(id, settled(25)).await.unwrap();
        assert_eq!(full.reservation.payment_status, PaymentStatus::Paid);
        assert_eq!(full.reservation.total_payment(), Decimal::from(40));
        assert_eq!(full.reservation.payments.len(), 2);
        // Confirmation stays an explicit step.
        assert_eq!(full.reservation.status, ReservationStatus::PendingPayment);
    }

    #[tokio::test]
    async fn failed_attempt_marks_failed_until_settled() {
        let (engine, _clock) = engine_at(t(13, 0));
        let id = unpaid_id(&engine).await;

        let failed = engine
            .record_payment(
                id,
                RecordPayment {
                    status: PaymentRecordStatus::Failed,
                    ..settled(40)
                },
            )
            .await
            .unwrap();
        assert_eq!(failed.reservation.payment_status, PaymentStatus::Failed);
        assert_eq!(failed.reservation.total_payment(), Decimal::ZERO);

        let paid = engine.record_payment(id, settled(40)).await.unwrap();
        assert_eq!(paid.reservation.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let (engine, _clock) = engine_at(t(13, 0));
        let id = unpaid_id(&engine).await;
        assert!(matches!(
            engine.record_payment(id, settled(0)).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let (engine, _clock) = engine_at(t(13, 0));
        assert!(matches!(
            engine.record_payment(404, settled(10)).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
