//! Reservation status synchronisation
//!
//! The reservation-level status is a projection over its barcodes. After every
//! barcode mutation the projection is recomputed from the stored barcode set
//! and written back with a compare-and-set, under a per-reservation lock.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::events::{Event, ReservationStatusChangedEvent, SharedEventBus};
use crate::application::locks::{KeyedGuard, KeyedLocks};
use crate::domain::reservation::project_status;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Reservation, ReservationStatus};
use crate::shared::SharedClock;

const MAX_SYNC_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct StatusSynchronizer {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    clock: SharedClock,
    locks: KeyedLocks,
}

impl StatusSynchronizer {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        clock: SharedClock,
    ) -> Self {
        Self {
            repos,
            events,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    /// Exclusive access to a reservation's status for explicit transitions.
    pub async fn lock(&self, reservation_id: i32) -> KeyedGuard {
        self.locks.lock(reservation_id).await
    }

    /// Recompute and persist the projected status. Returns the reservation as
    /// stored afterwards.
    pub async fn sync(&self, reservation_id: i32) -> DomainResult<Reservation> {
        let _guard = self.lock(reservation_id).await;

        for _ in 0..MAX_SYNC_ATTEMPTS {
            let mut reservation = self
                .repos
                .reservations()
                .find_by_id(reservation_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;
            let barcodes = self
                .repos
                .barcodes()
                .find_by_reservation(reservation_id)
                .await?;

            let current = reservation.status;
            let projected = project_status(current, &barcodes);
            if projected == current {
                return Ok(reservation);
            }

            // Another process may have moved the status since we read it.
            if !self
                .repos
                .reservations()
                .update_status(reservation_id, current, projected)
                .await?
            {
                continue;
            }

            info!(
                reservation_id,
                old_status = %current,
                new_status = %projected,
                "Reservation status synchronised"
            );
            metrics::counter!("reservation_status_transitions_total", "to" => projected.as_str())
                .increment(1);
            self.events
                .publish(Event::ReservationStatusChanged(ReservationStatusChangedEvent {
                    reservation_id,
                    old_status: current.as_str().to_string(),
                    new_status: projected.as_str().to_string(),
                    timestamp: self.clock.now(),
                }));

            reservation.status = projected;
            return Ok(reservation);
        }

        warn!(reservation_id, "Reservation status kept changing during sync");
        Err(DomainError::State(format!(
            "reservation {} status changed concurrently",
            reservation_id
        )))
    }

    /// Persist an explicit transition decided by the caller, who must hold
    /// the reservation lock.
    pub async fn transition(
        &self,
        reservation: &Reservation,
        from: ReservationStatus,
    ) -> DomainResult<()> {
        let to = reservation.status;
        if !self
            .repos
            .reservations()
            .update_status(reservation.id, from, to)
            .await?
        {
            warn!(
                reservation_id = reservation.id,
                from = %from,
                to = %to,
                "Transition lost to a concurrent update"
            );
            return Err(DomainError::State(format!(
                "reservation {} is no longer {}",
                reservation.id, from
            )));
        }

        info!(
            reservation_id = reservation.id,
            old_status = %from,
            new_status = %to,
            "Reservation status changed"
        );
        metrics::counter!("reservation_status_transitions_total", "to" => to.as_str()).increment(1);
        self.events
            .publish(Event::ReservationStatusChanged(ReservationStatusChangedEvent {
                reservation_id: reservation.id,
                old_status: from.as_str().to_string(),
                new_status: to.as_str().to_string(),
                timestamp: self.clock.now(),
            }));
        Ok(())
    }
}
