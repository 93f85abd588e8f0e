//! Extra-time billing
//!
//! Prices an extension from a single rate row and appends it to the
//! barcode's ledger. The barcode's end time moves by the billed minutes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{load_for_write, require_barcode, StatusSynchronizer};
use crate::application::events::{Event, ExtraTimeAddedEvent, SharedEventBus};
use crate::application::locks::KeyedLocks;
use crate::domain::barcode::{ExtraMinutesPolicy, ExtraTimeQuote};
use crate::domain::{DomainError, DomainResult, ExtraTimeCharge, RepositoryProvider};
use crate::shared::SharedClock;

/// Result of `addExtraTime`, for display
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraTimeReceipt {
    pub barcode_id: i32,
    pub charge: ExtraTimeCharge,
    pub end_time: DateTime<Utc>,
    pub computed_total: Decimal,
}

pub struct ExtraTimeService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    locks: KeyedLocks,
    status: StatusSynchronizer,
    policy: ExtraMinutesPolicy,
}

impl ExtraTimeService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        events: SharedEventBus,
        locks: KeyedLocks,
        status: StatusSynchronizer,
        policy: ExtraMinutesPolicy,
    ) -> Self {
        Self {
            repos,
            clock,
            events,
            locks,
            status,
            policy,
        }
    }

    /// `addExtraTime(barcodeId, rateRowRef, quantity)`
    pub async fn add_extra_time(
        &self,
        barcode_id: i32,
        rate_row_id: i32,
        quantity: i32,
    ) -> DomainResult<ExtraTimeReceipt> {
        if quantity < 1 {
            return Err(DomainError::Validation(format!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }

        let guard = self.locks.lock(barcode_id).await;
        let (barcode, reservation) = load_for_write(self.repos.as_ref(), barcode_id).await?;
        if let Err(e) = barcode.ensure_open() {
            warn!(barcode_id, "Extra time rejected: barcode completed");
            return Err(e);
        }

        let rate = self
            .repos
            .rates()
            .find_by_id(rate_row_id)
            .await?
            .ok_or_else(|| DomainError::not_found("RateRow", "id", rate_row_id))?;
        if rate.customer_type_id != barcode.customer_type_id {
            return Err(DomainError::Mismatch(format!(
                "rate row {} is for customer type {}, barcode {} is customer type {}",
                rate.id, rate.customer_type_id, barcode.id, barcode.customer_type_id
            )));
        }
        if rate.branch_id != reservation.branch_id {
            return Err(DomainError::Mismatch(format!(
                "rate row {} belongs to branch {}, reservation {} to branch {}",
                rate.id, rate.branch_id, reservation.id, reservation.branch_id
            )));
        }

        let quote = ExtraTimeQuote::new(&rate, quantity, self.policy)?;
        let now = self.clock.now();
        let charge = self
            .repos
            .barcodes()
            .append_extra_time(barcode_id, &quote, now)
            .await?;
        let updated = require_barcode(self.repos.as_ref(), barcode_id).await?;
        let end_time = updated.end_time();

        info!(
            barcode_id,
            reservation_id = reservation.id,
            rate_row_id,
            quantity,
            billed_minutes = charge.billed_minutes,
            computed_total = %charge.computed_total,
            end_time = %end_time,
            "Extra time added"
        );
        metrics::counter!("extra_time_charges_total").increment(1);
        metrics::counter!("extra_time_minutes_total").increment(charge.billed_minutes.max(0) as u64);
        self.events.publish(Event::ExtraTimeAdded(ExtraTimeAddedEvent {
            reservation_id: reservation.id,
            barcode_id,
            billed_minutes: charge.billed_minutes,
            computed_total: charge.computed_total,
            end_time,
            timestamp: now,
        }));

        drop(guard);
        self.status.sync(reservation.id).await?;

        Ok(ExtraTimeReceipt {
            barcode_id,
            computed_total: charge.computed_total,
            charge,
            end_time,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::*;
    use crate::application::services::{CreateReservation, CustomerTypeLine, InitialPayment};
    use crate::application::engine::SessionEngine;
    use crate::application::settings::EngineSettings;
    use crate::domain::ReservationDetail;
    use chrono::Duration;

    async fn booked(engine: &SessionEngine) -> ReservationDetail {
        engine
            .create_reservation(CreateReservation {
                branch_id: BRANCH,
                customer_id: CUSTOMER,
                lines: vec![
                    CustomerTypeLine {
                        customer_type_id: ADULT,
                        count: 2,
                        rate_row_id: ADULT_60,
                        barcode_numbers: vec![],
                    },
                    CustomerTypeLine {
                        customer_type_id: KID,
                        count: 1,
                        rate_row_id: KID_60,
                        barcode_numbers: vec![],
                    },
                ],
                payment: Some(InitialPayment {
                    amount: Decimal::from(50),
                    method: "card".into(),
                }),
            })
            .await
            .unwrap()
    }

    fn adult(detail: &ReservationDetail) -> i32 {
        detail
            .barcodes
            .iter()
            .find(|b| b.customer_type_id == ADULT)
            .map(|b| b.id)
            .unwrap()
    }

    fn kid(detail: &ReservationDetail) -> i32 {
        detail
            .barcodes
            .iter()
            .find(|b| b.customer_type_id == KID)
            .map(|b| b.id)
            .unwrap()
    }

    #[tokio::test]
    async fn thirty_minutes_moves_only_that_barcode() {
        let (engine, clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        let target = adult(&detail);

        clock.set(t(13, 50));
        let receipt = engine.add_extra_time(target, ADULT_30, 1).await.unwrap();
        assert_eq!(receipt.end_time, t(14, 30));
        assert_eq!(receipt.computed_total, Decimal::from(5));
        assert_eq!(receipt.charge.applied_at, t(13, 50));

        let after = engine.get_reservation(detail.reservation.id).await.unwrap();
        for b in &after.barcodes {
            let expected = if b.id == target { t(14, 30) } else { t(14, 0) };
            assert_eq!(b.end_time(), expected);
        }
        assert_eq!(after.end_time(), Some(t(14, 30)));
    }

    #[tokio::test]
    async fn end_time_tracks_ledger_sum() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        let target = adult(&detail);

        for _ in 0..3 {
            let receipt = engine.add_extra_time(target, ADULT_30, 2).await.unwrap();
            let barcode = engine.get_barcode(target).await.unwrap();
            let ledger: i64 = barcode
                .extra_time
                .iter()
                .map(|c| c.additional_minutes as i64)
                .sum();
            assert_eq!(
                barcode.end_time(),
                barcode.created_at + Duration::minutes(barcode.initial_minutes as i64 + ledger)
            );
            assert_eq!(receipt.end_time, barcode.end_time());
            assert_eq!(receipt.computed_total, Decimal::from(10));
        }
    }

    #[tokio::test]
    async fn per_unit_policy_scales_minutes() {
        let settings = EngineSettings {
            extra_minutes_policy: ExtraMinutesPolicy::PerUnit,
            ..EngineSettings::default()
        };
        let (engine, _clock) = engine_with(t(13, 0), settings);
        let detail = booked(&engine).await;
        let receipt = engine.add_extra_time(adult(&detail), ADULT_30, 2).await.unwrap();
        assert_eq!(receipt.end_time, t(15, 0));
        assert_eq!(receipt.charge.billed_minutes, 60);
        assert_eq!(receipt.computed_total, Decimal::from(10));
    }

    #[tokio::test]
    async fn completed_barcode_is_closed() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        let target = adult(&detail);
        engine.confirm_barcode(target).await.unwrap();

        assert_eq!(
            engine.add_extra_time(target, ADULT_30, 1).await.unwrap_err(),
            DomainError::BarcodeClosed(target)
        );
        assert!(engine.get_barcode(target).await.unwrap().extra_time.is_empty());
    }

    #[tokio::test]
    async fn rate_of_other_customer_type_is_a_mismatch() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        assert!(matches!(
            engine.add_extra_time(kid(&detail), ADULT_30, 1).await,
            Err(DomainError::Mismatch(_))
        ));
    }

    #[tokio::test]
    async fn rate_of_other_branch_is_a_mismatch() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        assert!(matches!(
            engine
                .add_extra_time(adult(&detail), OTHER_BRANCH_ADULT_30, 1)
                .await,
            Err(DomainError::Mismatch(_))
        ));
    }

    #[tokio::test]
    async fn quantity_must_be_positive() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        assert!(matches!(
            engine.add_extra_time(adult(&detail), ADULT_30, 0).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn completion_racing_extra_time_has_one_winner() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine).await;
        let target = adult(&detail);

        let (completed, extra) = tokio::join!(
            engine.confirm_barcode(target),
            engine.add_extra_time(target, ADULT_30, 1)
        );
        let completed = completed.unwrap();
        let barcode = engine.get_barcode(target).await.unwrap();
        match extra {
            Ok(receipt) => {
                // Extra time landed first; completion came after it.
                assert_eq!(barcode.extra_time.len(), 1);
                assert_eq!(receipt.end_time, barcode.end_time());
            }
            Err(e) => {
                assert_eq!(e, DomainError::BarcodeClosed(target));
                assert!(barcode.extra_time.is_empty());
            }
        }
        assert!(completed.is_completed());
    }
}
