//! Session & billing engine
//!
//! Facade over the application services. Transports (HTTP, CLI tools, tests)
//! talk to the engine only through this type.

use std::sync::Arc;

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::locks::KeyedLocks;
use crate::application::services::{
    BarcodeConfirmationService, CreateReservation, ExtraTimeReceipt, ExtraTimeService,
    OutsideTrackingService, PaymentLedgerService, RecordPayment, ReservationService, ScanOutcome,
    ScanService, StatusSynchronizer,
};
use crate::application::settings::EngineSettings;
use crate::domain::{
    BarcodeEntry, DomainResult, OutsideTrackEntry, RateRow, RepositoryProvider, ReservationDetail,
};
use crate::shared::SharedClock;

pub struct SessionEngine {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    settings: EngineSettings,
    reservations: ReservationService,
    confirmation: BarcodeConfirmationService,
    extra_time: ExtraTimeService,
    outside: OutsideTrackingService,
    scan: ScanService,
    payments: PaymentLedgerService,
}

impl SessionEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        settings: EngineSettings,
    ) -> Self {
        Self::with_event_bus(repos, clock, settings, create_event_bus())
    }

    pub fn with_event_bus(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        settings: EngineSettings,
        events: SharedEventBus,
    ) -> Self {
        // One lock table for every barcode writer, so completion, extra time
        // and outside tracking on the same barcode exclude each other.
        let barcode_locks = KeyedLocks::new();
        let status = StatusSynchronizer::new(repos.clone(), events.clone(), clock.clone());

        Self {
            reservations: ReservationService::new(
                repos.clone(),
                clock.clone(),
                events.clone(),
                status.clone(),
                settings.clone(),
            ),
            confirmation: BarcodeConfirmationService::new(
                repos.clone(),
                clock.clone(),
                events.clone(),
                barcode_locks.clone(),
                status.clone(),
            ),
            extra_time: ExtraTimeService::new(
                repos.clone(),
                clock.clone(),
                events.clone(),
                barcode_locks.clone(),
                status.clone(),
                settings.extra_minutes_policy,
            ),
            outside: OutsideTrackingService::new(
                repos.clone(),
                clock.clone(),
                events.clone(),
                barcode_locks,
                status.clone(),
            ),
            scan: ScanService::new(repos.clone()),
            payments: PaymentLedgerService::new(repos.clone(), clock.clone(), status),
            repos,
            clock,
            events,
            settings,
        }
    }

    pub fn repositories(&self) -> &Arc<dyn RepositoryProvider> {
        &self.repos
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ── Core operations ────────────────────────────────────────

    pub async fn create_reservation(
        &self,
        request: CreateReservation,
    ) -> DomainResult<ReservationDetail> {
        self.reservations.create(request).await
    }

    pub async fn confirm_barcode(&self, barcode_id: i32) -> DomainResult<BarcodeEntry> {
        self.confirmation.confirm_barcode(barcode_id).await
    }

    pub async fn confirm_all_barcodes(
        &self,
        reservation_id: i32,
    ) -> DomainResult<ReservationDetail> {
        self.confirmation.confirm_all(reservation_id).await
    }

    pub async fn add_extra_time(
        &self,
        barcode_id: i32,
        rate_row_id: i32,
        quantity: i32,
    ) -> DomainResult<ExtraTimeReceipt> {
        self.extra_time
            .add_extra_time(barcode_id, rate_row_id, quantity)
            .await
    }

    pub async fn mark_outside(&self, barcode_id: i32) -> DomainResult<OutsideTrackEntry> {
        self.outside.mark_outside(barcode_id).await
    }

    pub async fn mark_inside(&self, barcode_id: i32) -> DomainResult<OutsideTrackEntry> {
        self.outside.mark_inside(barcode_id).await
    }

    pub async fn resolve_scan(&self, scanned: &str) -> DomainResult<ScanOutcome> {
        self.scan.resolve(scanned).await
    }

    // ── Reservation lifecycle ──────────────────────────────────

    pub async fn get_reservation(&self, id: i32) -> DomainResult<ReservationDetail> {
        self.reservations.get(id).await
    }

    pub async fn confirm_reservation(&self, id: i32) -> DomainResult<ReservationDetail> {
        self.reservations.confirm(id).await
    }

    pub async fn cancel_reservation(&self, id: i32) -> DomainResult<ReservationDetail> {
        self.reservations.cancel(id).await
    }

    pub async fn complete_reservation(&self, id: i32) -> DomainResult<ReservationDetail> {
        self.reservations.complete(id).await
    }

    pub async fn record_payment(
        &self,
        reservation_id: i32,
        request: RecordPayment,
    ) -> DomainResult<ReservationDetail> {
        self.payments.record(reservation_id, request).await
    }

    // ── Lookups ────────────────────────────────────────────────

    pub async fn get_barcode(&self, barcode_id: i32) -> DomainResult<BarcodeEntry> {
        self.confirmation.get_barcode(barcode_id).await
    }

    pub async fn rate_catalogue(
        &self,
        branch_id: i32,
        customer_type_id: i32,
    ) -> DomainResult<Vec<RateRow>> {
        self.reservations
            .rate_catalogue(branch_id, customer_type_id)
            .await
    }
}

pub type SharedEngine = Arc<SessionEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::Event;
    use crate::application::services::test_support::*;
    use crate::application::services::{CustomerTypeLine, InitialPayment};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn lifecycle_publishes_events_in_order() {
        let (engine, _clock) = engine_at(t(13, 0));
        let mut sub = engine.events().subscribe();

        let detail = engine
            .create_reservation(CreateReservation {
                branch_id: BRANCH,
                customer_id: CUSTOMER,
                lines: vec![CustomerTypeLine {
                    customer_type_id: ADULT,
                    count: 1,
                    rate_row_id: ADULT_60,
                    barcode_numbers: vec![],
                }],
                payment: Some(InitialPayment {
                    amount: Decimal::from(20),
                    method: "card".into(),
                }),
            })
            .await
            .unwrap();
        let barcode = detail.barcodes[0].id;
        engine.mark_outside(barcode).await.unwrap();
        engine.mark_inside(barcode).await.unwrap();
        engine.add_extra_time(barcode, ADULT_30, 1).await.unwrap();
        engine.confirm_barcode(barcode).await.unwrap();

        let mut kinds = Vec::new();
        while let Some(msg) = sub.try_recv() {
            kinds.push(msg.event.event_type());
            if let Event::ReservationStatusChanged(e) = &msg.event {
                assert_eq!(e.reservation_id, detail.reservation.id);
            }
        }
        assert_eq!(
            kinds,
            vec![
                "reservation_created",
                "guest_went_outside",
                "reservation_status_changed",
                "guest_came_back",
                "reservation_status_changed",
                "extra_time_added",
                "barcode_completed",
                "reservation_status_changed",
            ]
        );
    }
}
