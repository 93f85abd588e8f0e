//! Barcode confirmation workflow
//!
//! Both operations are idempotent: completing an already completed barcode
//! returns it unchanged, and "complete all" only touches pending entries.

use std::sync::Arc;

use tracing::info;

use super::{load_detail, load_for_write, require_barcode, require_reservation, StatusSynchronizer};
use crate::application::events::{BarcodeCompletedEvent, Event, SharedEventBus};
use crate::application::locks::KeyedLocks;
use crate::domain::{BarcodeEntry, DomainError, DomainResult, RepositoryProvider, ReservationDetail};
use crate::shared::SharedClock;

pub struct BarcodeConfirmationService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    locks: KeyedLocks,
    status: StatusSynchronizer,
}

impl BarcodeConfirmationService {
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

    /// `confirmBarcode(barcodeId)`
    pub async fn confirm_barcode(&self, barcode_id: i32) -> DomainResult<BarcodeEntry> {
        let barcode = {
            let _guard = self.locks.lock(barcode_id).await;
            let (barcode, _) = load_for_write(self.repos.as_ref(), barcode_id).await?;
            if barcode.is_completed() {
                return Ok(barcode);
            }
            self.complete_pending(&barcode).await?;
            require_barcode(self.repos.as_ref(), barcode_id).await?
        };

        self.status.sync(barcode.reservation_id).await?;
        Ok(barcode)
    }

    /// `confirmAllBarcodes(reservationId)`
    pub async fn confirm_all(&self, reservation_id: i32) -> DomainResult<ReservationDetail> {
        let reservation = require_reservation(self.repos.as_ref(), reservation_id).await?;
        reservation.ensure_not_cancelled()?;

        let barcodes = self
            .repos
            .barcodes()
            .find_by_reservation(reservation_id)
            .await?;
        if barcodes.is_empty() {
            return Err(DomainError::not_found(
                "BarcodeEntry",
                "reservation_id",
                reservation_id,
            ));
        }

        let mut completed = 0usize;
        for barcode in barcodes.iter().filter(|b| !b.is_completed()) {
            let _guard = self.locks.lock(barcode.id).await;
            if self.complete_pending(barcode).await? {
                completed += 1;
            }
        }

        info!(
            reservation_id,
            total = barcodes.len(),
            completed,
            "Barcodes confirmed for reservation"
        );

        let reservation = self.status.sync(reservation_id).await?;
        load_detail(self.repos.as_ref(), reservation).await
    }

    pub async fn get_barcode(&self, barcode_id: i32) -> DomainResult<BarcodeEntry> {
        require_barcode(self.repos.as_ref(), barcode_id).await
    }

    /// Guarded PENDING → COMPLETED. `false` when another writer got there first.
    async fn complete_pending(&self, barcode: &BarcodeEntry) -> DomainResult<bool> {
        let now = self.clock.now();
        let changed = self
            .repos
            .barcodes()
            .complete_if_pending(barcode.id, now)
            .await?;
        if changed {
            info!(
                barcode_id = barcode.id,
                reservation_id = barcode.reservation_id,
                barcode_number = %barcode.barcode_number,
                "Barcode completed"
            );
            metrics::counter!("barcodes_completed_total").increment(1);
            self.events.publish(Event::BarcodeCompleted(BarcodeCompletedEvent {
                reservation_id: barcode.reservation_id,
                barcode_id: barcode.id,
                barcode_number: barcode.barcode_number.clone(),
                timestamp: now,
            }));
        }
        Ok(changed)
    }
}

// ── Tests ──────────────────────────────────────────────────────
