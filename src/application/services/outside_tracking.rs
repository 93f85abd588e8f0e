//! Outside tracking
//!
//! Records guests stepping out and coming back. A barcode has at most one
//! open entry; the reservation status follows via the synchroniser.

use std::sync::Arc;

use tracing::{info, warn};

use super::{load_for_write, StatusSynchronizer};
use crate::application::events::{Event, OutsideMovementEvent, SharedEventBus};
use crate::application::locks::KeyedLocks;
use crate::domain::{
    BarcodeEntry, DomainError, DomainResult, OutsideTrackEntry, RepositoryProvider, Reservation,
    ReservationStatus,
};
use crate::shared::SharedClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Out,
    In,
}

pub struct OutsideTrackingService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    locks: KeyedLocks,
    status: StatusSynchronizer,
}

impl OutsideTrackingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        events: SharedEventBus,
        locks: KeyedLocks,
        status: StatusSynchronizer,
    ) -> Self {
        Self {
            repos,
            clock,
            events,
            locks,
            status,
        }
    }

    /// `markOutside(barcodeId)`
    pub async fn mark_outside(&self, barcode_id: i32) -> DomainResult<OutsideTrackEntry> {
        self.record(barcode_id, Movement::Out).await
    }

    /// `markInside(barcodeId)`
    pub async fn mark_inside(&self, barcode_id: i32) -> DomainResult<OutsideTrackEntry> {
        self.record(barcode_id, Movement::In).await
    }

    async fn record(&self, barcode_id: i32, movement: Movement) -> DomainResult<OutsideTrackEntry> {
        let guard = self.locks.lock(barcode_id).await;
        let (barcode, reservation) = load_for_write(self.repos.as_ref(), barcode_id).await?;
        if let Err(e) = check_movement(&barcode, &reservation, movement) {
            warn!(barcode_id, ?movement, error = %e, "Outside movement rejected");
            return Err(e);
        }

        let now = self.clock.now();
        let track = match movement {
            Movement::Out => self.repos.barcodes().open_outside_track(barcode_id, now).await?,
            Movement::In => self.repos.barcodes().close_outside_track(barcode_id, now).await?,
        };
        drop(guard);

        let event = OutsideMovementEvent {
            reservation_id: reservation.id,
            barcode_id,
            track_id: track.id,
            timestamp: now,
        };
        match movement {
            Movement::Out => {
                info!(
                    barcode_id,
                    reservation_id = reservation.id,
                    track_id = track.id,
                    "Guest went outside"
                );
                metrics::counter!("outside_movements_total", "direction" => "out").increment(1);
                self.events.publish(Event::GuestWentOutside(event));
            }
            Movement::In => {
                info!(
                    barcode_id,
                    reservation_id = reservation.id,
                    track_id = track.id,
                    minutes_outside = track.minutes_outside(now),
                    "Guest came back"
                );
                metrics::counter!("outside_movements_total", "direction" => "in").increment(1);
                self.events.publish(Event::GuestCameBack(event));
            }
        }

        self.status.sync(reservation.id).await?;
        Ok(track)
    }
}

/// Fast-path checks against the loaded snapshot. The repository repeats the
/// open/closed checks atomically with the write.
fn check_movement(
    barcode: &BarcodeEntry,
    reservation: &Reservation,
    movement: Movement,
) -> DomainResult<()> {
    barcode.ensure_open()?;
    if reservation.status == ReservationStatus::PendingPayment {
        return Err(DomainError::State(format!(
            "reservation {} is awaiting payment",
            reservation.id
        )));
    }
    match movement {
        Movement::Out if barcode.is_outside() => Err(DomainError::AlreadyOutside(barcode.id)),
        Movement::In if !barcode.is_outside() => Err(DomainError::NotOutside(barcode.id)),
        _ => Ok(()),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::application::engine::SessionEngine;
    use crate::application::services::test_support::*;
    use crate::application::services::{CreateReservation, CustomerTypeLine, InitialPayment};
    use crate::domain::{DomainError, ReservationDetail, ReservationStatus};
    use chrono::{FixedOffset, NaiveTime};
    use rust_decimal::Decimal;

    async fn booked(engine: &SessionEngine, paid: bool) -> ReservationDetail {
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
                payment: paid.then(|| InitialPayment {
                    amount: Decimal::from(40),
                    method: "card".into(),
                }),
            })
            .await
            .unwrap()
    }

    async fn status_of(engine: &SessionEngine, id: i32) -> ReservationStatus {
        engine.get_reservation(id).await.unwrap().reservation.status
    }

    #[tokio::test]
    async fn out_at_two_in_at_quarter_to_three() {
        let (engine, clock) = engine_at(t(13, 30));
        let detail = booked(&engine, true).await;
        let id = detail.barcodes[0].id;

        clock.set(t(14, 0));
        let out = engine.mark_outside(id).await.unwrap();
        assert!(out.is_open());

        clock.set(t(14, 30));
        assert_eq!(
            engine.mark_outside(id).await.unwrap_err(),
            DomainError::AlreadyOutside(id)
        );

        clock.set(t(14, 45));
        let back = engine.mark_inside(id).await.unwrap();
        assert_eq!(back.id, out.id);

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(back.out_time(utc), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(back.in_time(utc), NaiveTime::from_hms_opt(14, 45, 0));
        assert_eq!(engine.get_barcode(id).await.unwrap().outside_tracks.len(), 1);
    }

    #[tokio::test]
    async fn inside_without_outside_is_rejected() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine, true).await;
        let id = detail.barcodes[0].id;
        assert_eq!(
            engine.mark_inside(id).await.unwrap_err(),
            DomainError::NotOutside(id)
        );
    }

    #[tokio::test]
    async fn reservation_status_follows_movement() {
        let (engine, clock) = engine_at(t(13, 0));
        let detail = booked(&engine, true).await;
        let rid = detail.reservation.id;
        let (a, b) = (detail.barcodes[0].id, detail.barcodes[1].id);

        engine.mark_outside(a).await.unwrap();
        assert_eq!(status_of(&engine, rid).await, ReservationStatus::WentOutside);

        engine.mark_outside(b).await.unwrap();
        clock.set(t(13, 20));
        engine.mark_inside(a).await.unwrap();
        assert_eq!(status_of(&engine, rid).await, ReservationStatus::WentOutside);

        engine.mark_inside(b).await.unwrap();
        assert_eq!(status_of(&engine, rid).await, ReservationStatus::BackInside);

        engine.mark_outside(a).await.unwrap();
        assert_eq!(status_of(&engine, rid).await, ReservationStatus::WentOutside);
    }

    #[tokio::test]
    async fn completed_barcode_rejects_movement() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine, true).await;
        let id = detail.barcodes[0].id;
        engine.confirm_barcode(id).await.unwrap();

        assert_eq!(engine.mark_outside(id).await.unwrap_err(), DomainError::BarcodeClosed(id));
        assert_eq!(engine.mark_inside(id).await.unwrap_err(), DomainError::BarcodeClosed(id));
    }

    #[tokio::test]
    async fn unpaid_reservation_cannot_go_outside() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine, false).await;
        assert!(matches!(
            engine.mark_outside(detail.barcodes[0].id).await,
            Err(DomainError::State(_))
        ));
    }

    #[tokio::test]
    async fn open_track_blocks_cancellation() {
        let (engine, _clock) = engine_at(t(13, 0));
        let detail = booked(&engine, true).await;
        engine.mark_outside(detail.barcodes[0].id).await.unwrap();
        assert!(matches!(
            engine.cancel_reservation(detail.reservation.id).await,
            Err(DomainError::State(_))
        ));
    }
}
