//! In-memory repository provider
//!
//! Backs the engine with `DashMap`s for development and tests. Each barcode
//! write runs under the map's entry lock and goes through the domain
//! mutators, so the guarded-write semantics match the database provider.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::barcode::{
    assign_barcode_numbers, BarcodeEntry, BarcodeRepository, BarcodeStatus, ExtraTimeCharge,
    ExtraTimeQuote, OutsideTrackEntry,
};
use crate::domain::directory::{Branch, BranchDirectory, Customer, CustomerDirectory};
use crate::domain::rate::{RateRow, RateTable};
use crate::domain::reservation::{
    CustomerTypeCount, NewPayment, NewReservation, Payment, PaymentStatus, Reservation,
    ReservationRepository, ReservationStatus,
};
use crate::domain::scan::mobile_matches;
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    branches: DashMap<i32, Branch>,
    customers: DashMap<i32, Customer>,
    rates: DashMap<i32, RateRow>,
    reservations: DashMap<i32, Reservation>,
    barcodes: DashMap<i32, BarcodeEntry>,
    reservation_counter: AtomicI32,
    row_counter: AtomicI32,
    /// Held across the number check and the barcode inserts of a booking
    numbering: Mutex<()>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            branches: DashMap::new(),
            customers: DashMap::new(),
            rates: DashMap::new(),
            reservations: DashMap::new(),
            barcodes: DashMap::new(),
            reservation_counter: AtomicI32::new(1),
            row_counter: AtomicI32::new(1),
            numbering: Mutex::new(()),
        }
    }

    pub fn add_branch(&self, branch: Branch) {
        self.branches.insert(branch.id, branch);
    }

    pub fn add_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
    }

    pub fn add_rate(&self, rate: RateRow) {
        self.rates.insert(rate.id, rate);
    }

    fn next_row_id(&self) -> i32 {
        self.row_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn reservation_is_live(&self, reservation_id: i32) -> bool {
        self.reservations
            .get(&reservation_id)
            .map(|r| !r.status.is_terminal())
            .unwrap_or(false)
    }

    fn number_in_use(&self, barcode_number: &str) -> bool {
        let candidates: Vec<i32> = self
            .barcodes
            .iter()
            .filter(|b| b.barcode_number == barcode_number && !b.is_completed())
            .map(|b| b.reservation_id)
            .collect();
        candidates.into_iter().any(|r| self.reservation_is_live(r))
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn barcodes(&self) -> &dyn BarcodeRepository {
        self
    }

    fn rates(&self) -> &dyn RateTable {
        self
    }

    fn branches(&self) -> &dyn BranchDirectory {
        self
    }

    fn customers(&self) -> &dyn CustomerDirectory {
        self
    }
}

// ── Reservations ───────────────────────────────────────────────

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn create(&self, new: NewReservation) -> DomainResult<Reservation> {
        let _numbering = self
            .numbering
            .lock()
            .map_err(|_| DomainError::Storage("barcode numbering lock poisoned".into()))?;
        let id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);

        let numbers = assign_barcode_numbers(&new.barcode_prefix, id, &new.barcodes)?;
        if let Some(taken) = numbers.iter().find(|n| self.number_in_use(n)) {
            return Err(DomainError::Validation(format!(
                "barcode number {} is already in use",
                taken
            )));
        }

        let counts = new
            .counts
            .iter()
            .map(|c| CustomerTypeCount {
                id: self.next_row_id(),
                customer_type_id: c.customer_type_id,
                rate_row_id: c.rate_row_id,
                count: c.count,
                unit_price: c.unit_price,
                duration_minutes: c.duration_minutes,
            })
            .collect();
        let payments = new
            .payments
            .into_iter()
            .map(|p| to_payment(self.next_row_id(), id, p))
            .collect();

        for (b, number) in new.barcodes.into_iter().zip(numbers) {
            let barcode_id = self.next_row_id();
            self.barcodes.insert(
                barcode_id,
                BarcodeEntry {
                    id: barcode_id,
                    reservation_id: id,
                    barcode_number: number,
                    customer_type_id: b.customer_type_id,
                    initial_minutes: b.initial_minutes,
                    status: BarcodeStatus::Pending,
                    created_at: b.created_at,
                    completed_at: None,
                    extra_time: vec![],
                    outside_tracks: vec![],
                },
            );
        }

        let reservation = Reservation {
            id,
            branch_id: new.branch_id,
            customer_id: new.customer_id,
            status: new.status,
            payment_status: new.payment_status,
            total_price: new.total_price,
            created_date: new.created_date,
            counts,
            payments,
        };
        self.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn find_by_customers(&self, customer_ids: &[i32]) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| customer_ids.contains(&r.customer_id))
            .map(|r| r.clone())
            .collect();
        found.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(found)
    }

    async fn update_status(
        &self,
        id: i32,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool> {
        let mut reservation = self
            .reservations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
        if reservation.status != from {
            return Ok(false);
        }
        reservation.status = to;
        Ok(true)
    }

    async fn append_payment(
        &self,
        id: i32,
        payment: NewPayment,
        payment_status: PaymentStatus,
    ) -> DomainResult<Payment> {
        let payment_id = self.next_row_id();
        let mut reservation = self
            .reservations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
        let stored = to_payment(payment_id, id, payment);
        reservation.payments.push(stored.clone());
        reservation.payment_status = payment_status;
        Ok(stored)
    }
}

fn to_payment(id: i32, reservation_id: i32, p: NewPayment) -> Payment {
    Payment {
        id,
        reservation_id,
        amount: p.amount,
        method: p.method,
        status: p.status,
        recorded_at: p.recorded_at,
    }
}

// ── Barcodes ───────────────────────────────────────────────────

#[async_trait]
impl BarcodeRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BarcodeEntry>> {
        Ok(self.barcodes.get(&id).map(|b| b.clone()))
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Vec<BarcodeEntry>> {
        let mut found: Vec<BarcodeEntry> = self
            .barcodes
            .iter()
            .filter(|b| b.reservation_id == reservation_id)
            .map(|b| b.clone())
            .collect();
        found.sort_by_key(|b| b.id);
        Ok(found)
    }

    async fn find_by_number(&self, barcode_number: &str) -> DomainResult<Vec<BarcodeEntry>> {
        let mut found: Vec<BarcodeEntry> = self
            .barcodes
            .iter()
            .filter(|b| b.barcode_number == barcode_number)
            .map(|b| b.clone())
            .collect();
        found.sort_by_key(|b| b.id);
        Ok(found)
    }

    async fn is_number_in_use(&self, barcode_number: &str) -> DomainResult<bool> {
        Ok(self.number_in_use(barcode_number))
    }

    async fn complete_if_pending(&self, id: i32, at: DateTime<Utc>) -> DomainResult<bool> {
        let mut barcode = self
            .barcodes
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("BarcodeEntry", "id", id))?;
        Ok(barcode.complete(at))
    }

    async fn append_extra_time(
        &self,
        id: i32,
        quote: &ExtraTimeQuote,
        at: DateTime<Utc>,
    ) -> DomainResult<ExtraTimeCharge> {
        let charge_id = self.next_row_id();
        let mut barcode = self
            .barcodes
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("BarcodeEntry", "id", id))?;
        barcode.apply_extra_time(charge_id, quote, at).cloned()
    }

    async fn open_outside_track(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<OutsideTrackEntry> {
        let track_id = self.next_row_id();
        let mut barcode = self
            .barcodes
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("BarcodeEntry", "id", id))?;
        barcode.go_outside(track_id, at).cloned()
    }

    async fn close_outside_track(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<OutsideTrackEntry> {
        let mut barcode = self
            .barcodes
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("BarcodeEntry", "id", id))?;
        barcode.come_inside(at).cloned()
    }
}

// ── Collaborators ──────────────────────────────────────────────

#[async_trait]
impl RateTable for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<RateRow>> {
        Ok(self.rates.get(&id).map(|r| r.clone()))
    }

    async fn list(&self, branch_id: i32, customer_type_id: i32) -> DomainResult<Vec<RateRow>> {
        let mut rows: Vec<RateRow> = self
            .rates
            .iter()
            .filter(|r| r.applies_to(branch_id, customer_type_id))
            .map(|r| r.clone())
            .collect();
        rows.sort_by_key(|r| (r.duration_minutes, r.id));
        Ok(rows)
    }
}

#[async_trait]
impl BranchDirectory for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>> {
        Ok(self.branches.get(&id).map(|b| b.clone()))
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|c| c.clone()))
    }

    async fn find_by_mobile(&self, mobile_digits: &str) -> DomainResult<Vec<Customer>> {
        let mut found: Vec<Customer> = self
            .customers
            .iter()
            .filter(|c| {
                c.mobile
                    .as_deref()
                    .map(|m| mobile_matches(m, mobile_digits))
                    .unwrap_or(false)
            })
            .map(|c| c.clone())
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::barcode::{ExtraMinutesPolicy, NewBarcodeEntry};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn new_reservation(numbers: &[Option<&str>]) -> NewReservation {
        NewReservation {
            branch_id: 1,
            customer_id: 1,
            status: ReservationStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            total_price: Decimal::from(20),
            created_date: now(),
            counts: vec![],
            barcodes: numbers
                .iter()
                .map(|n| NewBarcodeEntry {
                    barcode_number: n.map(String::from),
                    customer_type_id: 1,
                    initial_minutes: 60,
                    created_at: now(),
                })
                .collect(),
            payments: vec![],
            barcode_prefix: "B".into(),
        }
    }

    #[tokio::test]
    async fn generated_numbers_follow_reservation_and_sequence() {
        let repos = InMemoryRepositoryProvider::new();
        let r = repos
            .reservations()
            .create(new_reservation(&[None, Some("T-1"), None]))
            .await
            .unwrap();
        let numbers: Vec<String> = repos
            .barcodes()
            .find_by_reservation(r.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.barcode_number)
            .collect();
        assert_eq!(numbers, vec!["B000001-001", "T-1", "B000001-003"]);
    }

    #[tokio::test]
    async fn guarded_writes_respect_completion() {
        let repos = InMemoryRepositoryProvider::new();
        let r = repos
            .reservations()
            .create(new_reservation(&[None]))
            .await
            .unwrap();
        let id = repos.barcodes().find_by_reservation(r.id).await.unwrap()[0].id;

        assert!(repos.barcodes().complete_if_pending(id, now()).await.unwrap());
        assert!(!repos.barcodes().complete_if_pending(id, now()).await.unwrap());

        let rate = RateRow {
            id: 1,
            branch_id: 1,
            customer_type_id: 1,
            duration_minutes: 30,
            price: Decimal::from(5),
        };
        let quote = ExtraTimeQuote::new(&rate, 1, ExtraMinutesPolicy::PerCharge).unwrap();
        assert_eq!(
            repos.barcodes().append_extra_time(id, &quote, now()).await,
            Err(DomainError::BarcodeClosed(id))
        );
    }

    #[tokio::test]
    async fn status_update_is_compare_and_set() {
        let repos = InMemoryRepositoryProvider::new();
        let r = repos
            .reservations()
            .create(new_reservation(&[None]))
            .await
            .unwrap();
        let reservations = repos.reservations();
        assert!(!reservations
            .update_status(r.id, ReservationStatus::PendingPayment, ReservationStatus::Cancelled)
            .await
            .unwrap());
        assert!(reservations
            .update_status(r.id, ReservationStatus::Confirmed, ReservationStatus::WentOutside)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn number_in_use_ignores_finished_reservations() {
        let repos = InMemoryRepositoryProvider::new();
        let r = repos
            .reservations()
            .create(new_reservation(&[Some("T-9")]))
            .await
            .unwrap();
        assert!(repos.barcodes().is_number_in_use("T-9").await.unwrap());

        repos
            .reservations()
            .update_status(r.id, ReservationStatus::Confirmed, ReservationStatus::Cancelled)
            .await
            .unwrap();
        assert!(!repos.barcodes().is_number_in_use("T-9").await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_number_held_by_live_reservation() {
        let repos = InMemoryRepositoryProvider::new();
        let first = repos
            .reservations()
            .create(new_reservation(&[None]))
            .await
            .unwrap();
        let generated = repos.barcodes().find_by_reservation(first.id).await.unwrap()[0]
            .barcode_number
            .clone();

        let clash = repos
            .reservations()
            .create(new_reservation(&[Some(generated.as_str())]))
            .await;
        assert!(matches!(clash, Err(DomainError::Validation(_))));
        assert_eq!(repos.barcodes().find_by_number(&generated).await.unwrap().len(), 1);

        repos
            .reservations()
            .update_status(first.id, ReservationStatus::Confirmed, ReservationStatus::Cancelled)
            .await
            .unwrap();
        assert!(repos
            .reservations()
            .create(new_reservation(&[Some(generated.as_str())]))
            .await
            .is_ok());
    }
}
