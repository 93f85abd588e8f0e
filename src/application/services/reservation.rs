//! Reservation service
//!
//! Booking creation with initial pricing, and the explicit reservation
//! transitions (confirm, cancel, complete).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{load_detail, require_reservation, StatusSynchronizer};
use crate::application::events::{Event, ReservationCreatedEvent, SharedEventBus};
use crate::application::settings::EngineSettings;
use crate::domain::barcode::{is_generated_number, NewBarcodeEntry};
use crate::domain::reservation::{
    NewCustomerTypeCount, NewPayment, NewReservation, PaymentRecordStatus,
};
use crate::domain::scan::is_mobile_number;
use crate::domain::{
    DomainError, DomainResult, PaymentStatus, RateRow, RepositoryProvider, ReservationDetail,
    ReservationStatus,
};
use crate::shared::SharedClock;

/// One customer-type row of a booking request
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTypeLine {
    pub customer_type_id: i32,
    pub count: i32,
    pub rate_row_id: i32,
    /// Pre-printed ticket numbers; generated when empty
    pub barcode_numbers: Vec<String>,
}

/// Payment the caller captured before submitting the booking
#[derive(Debug, Clone, PartialEq)]
pub struct InitialPayment {
    pub amount: Decimal,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateReservation {
    pub branch_id: i32,
    pub customer_id: i32,
    pub lines: Vec<CustomerTypeLine>,
    pub payment: Option<InitialPayment>,
}

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    status: StatusSynchronizer,
    settings: EngineSettings,
    /// Serialises the number check and the insert of concurrent bookings
    numbering: Mutex<()>,
}

impl ReservationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        events: SharedEventBus,
        status: StatusSynchronizer,
        settings: EngineSettings,
    ) -> Self {
        Self {
            repos,
            clock,
            events,
            status,
            settings,
            numbering: Mutex::new(()),
        }
    }

    /// `createReservation(branchId, customerRef, customerTypeCounts[])`
    pub async fn create(&self, request: CreateReservation) -> DomainResult<ReservationDetail> {
        validate_counts(&request.lines)?;

        let branch = self
            .repos
            .branches()
            .find_by_id(request.branch_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Branch", "id", request.branch_id))?;
        if !branch.is_active {
            return Err(DomainError::Validation(format!(
                "branch {} is not active",
                branch.id
            )));
        }
        self.repos
            .customers()
            .find_by_id(request.customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", "id", request.customer_id))?;

        let mut rates = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let rate = self
                .repos
                .rates()
                .find_by_id(line.rate_row_id)
                .await?
                .ok_or_else(|| DomainError::not_found("RateRow", "id", line.rate_row_id))?;
            if !rate.applies_to(request.branch_id, line.customer_type_id) {
                return Err(DomainError::Validation(format!(
                    "rate row {} does not belong to branch {} and customer type {}",
                    rate.id, request.branch_id, line.customer_type_id
                )));
            }
            rates.push(rate);
        }

        let numbering = self.numbering.lock().await;
        self.validate_barcode_numbers(&request.lines).await?;

        let now = self.clock.now();
        let total_price: Decimal = request
            .lines
            .iter()
            .zip(&rates)
            .map(|(line, rate)| rate.price * Decimal::from(line.count))
            .sum();

        let payments = match &request.payment {
            Some(payment) => {
                validate_payment(payment.amount, &payment.method)?;
                vec![NewPayment {
                    amount: payment.amount,
                    method: payment.method.trim().to_string(),
                    status: PaymentRecordStatus::Settled,
                    recorded_at: now,
                }]
            }
            None => Vec::new(),
        };
        let payment_status = derive_initial_payment_status(total_price, &payments);
        let status = if payment_status == PaymentStatus::Paid {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::PendingPayment
        };

        let new_reservation = NewReservation {
            branch_id: request.branch_id,
            customer_id: request.customer_id,
            status,
            payment_status,
            total_price,
            created_date: now,
            counts: request
                .lines
                .iter()
                .zip(&rates)
                .map(|(line, rate)| count_row(line, rate))
                .collect(),
            barcodes: request
                .lines
                .iter()
                .zip(&rates)
                .flat_map(|(line, rate)| self.barcodes_for(line, rate, now))
                .collect(),
            payments,
            barcode_prefix: self.settings.barcode_prefix.clone(),
        };

        let reservation = self.repos.reservations().create(new_reservation).await?;
        drop(numbering);
        let detail = load_detail(self.repos.as_ref(), reservation).await?;

        info!(
            reservation_id = detail.reservation.id,
            branch_id = detail.reservation.branch_id,
            status = %detail.reservation.status,
            total_price = %detail.reservation.total_price,
            barcodes = detail.barcodes.len(),
            "Reservation created"
        );
        metrics::counter!("reservations_created_total", "status" => detail.reservation.status.as_str())
            .increment(1);
        self.events
            .publish(Event::ReservationCreated(ReservationCreatedEvent {
                reservation_id: detail.reservation.id,
                branch_id: detail.reservation.branch_id,
                customer_id: detail.reservation.customer_id,
                status: detail.reservation.status.as_str().to_string(),
                total_price: detail.reservation.total_price,
                barcode_count: detail.barcodes.len(),
                timestamp: now,
            }));

        Ok(detail)
    }

    pub async fn get(&self, id: i32) -> DomainResult<ReservationDetail> {
        let reservation = require_reservation(self.repos.as_ref(), id).await?;
        load_detail(self.repos.as_ref(), reservation).await
    }

    /// PENDING_PAYMENT → CONFIRMED once the payment is captured.
    pub async fn confirm(&self, id: i32) -> DomainResult<ReservationDetail> {
        {
            let _guard = self.status.lock(id).await;
            let mut reservation = require_reservation(self.repos.as_ref(), id).await?;
            let from = reservation.status;
            if let Err(e) = reservation.confirm() {
                warn!(reservation_id = id, status = %from, error = %e, "Confirmation rejected");
                return Err(e);
            }
            self.status.transition(&reservation, from).await?;
        }
        // Barcodes may already all be completed.
        self.status.sync(id).await?;
        self.get(id).await
    }

    pub async fn cancel(&self, id: i32) -> DomainResult<ReservationDetail> {
        let guard = self.status.lock(id).await;
        let mut reservation = require_reservation(self.repos.as_ref(), id).await?;
        let barcodes = self.repos.barcodes().find_by_reservation(id).await?;
        let from = reservation.status;
        if let Err(e) = reservation.cancel(&barcodes) {
            warn!(reservation_id = id, status = %from, error = %e, "Cancellation rejected");
            return Err(e);
        }
        self.status.transition(&reservation, from).await?;
        drop(guard);

        self.get(id).await
    }

    /// Explicit completion; a no-op when already completed.
    pub async fn complete(&self, id: i32) -> DomainResult<ReservationDetail> {
        let guard = self.status.lock(id).await;
        let mut reservation = require_reservation(self.repos.as_ref(), id).await?;
        let barcodes = self.repos.barcodes().find_by_reservation(id).await?;
        let from = reservation.status;
        match reservation.complete(&barcodes) {
            Ok(true) => self.status.transition(&reservation, from).await?,
            Ok(false) => {}
            Err(e) => {
                warn!(reservation_id = id, status = %from, error = %e, "Completion rejected");
                return Err(e);
            }
        }
        drop(guard);

        self.get(id).await
    }

    pub async fn rate_catalogue(
        &self,
        branch_id: i32,
        customer_type_id: i32,
    ) -> DomainResult<Vec<RateRow>> {
        self.repos.rates().list(branch_id, customer_type_id).await
    }

    fn barcodes_for(
        &self,
        line: &CustomerTypeLine,
        rate: &RateRow,
        now: DateTime<Utc>,
    ) -> Vec<NewBarcodeEntry> {
        let wanted = self.settings.issuance.barcodes_for(line.count);
        (0..wanted)
            .map(|i| NewBarcodeEntry {
                barcode_number: line.barcode_numbers.get(i).map(|n| n.trim().to_string()),
                customer_type_id: line.customer_type_id,
                initial_minutes: rate.duration_minutes,
                created_at: now,
            })
            .collect()
    }

    async fn validate_barcode_numbers(&self, lines: &[CustomerTypeLine]) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for line in lines {
            if line.barcode_numbers.is_empty() {
                continue;
            }
            let wanted = self.settings.issuance.barcodes_for(line.count);
            if line.barcode_numbers.len() != wanted {
                return Err(DomainError::Validation(format!(
                    "customer type {} needs {} barcode numbers, got {}",
                    line.customer_type_id,
                    wanted,
                    line.barcode_numbers.len()
                )));
            }
            for raw in &line.barcode_numbers {
                let number = raw.trim();
                if number.is_empty() {
                    return Err(DomainError::Validation("barcode number is empty".into()));
                }
                if is_mobile_number(number) {
                    return Err(DomainError::Validation(format!(
                        "barcode number {} looks like a mobile number",
                        number
                    )));
                }
                if is_generated_number(&self.settings.barcode_prefix, number) {
                    return Err(DomainError::Validation(format!(
                        "barcode number {} is reserved for generated tickets",
                        number
                    )));
                }
                if !seen.insert(number.to_string()) {
                    return Err(DomainError::Validation(format!(
                        "barcode number {} is repeated",
                        number
                    )));
                }
                if self.repos.barcodes().is_number_in_use(number).await? {
                    return Err(DomainError::Validation(format!(
                        "barcode number {} is already in use",
                        number
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_counts(lines: &[CustomerTypeLine]) -> DomainResult<()> {
    if let Some(line) = lines.iter().find(|l| l.count < 0) {
        return Err(DomainError::Validation(format!(
            "count for customer type {} must not be negative",
            line.customer_type_id
        )));
    }
    if lines.iter().map(|l| l.count as i64).sum::<i64>() < 1 {
        return Err(DomainError::Validation(
            "a reservation needs at least one guest".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_payment(amount: Decimal, method: &str) -> DomainResult<()> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "payment amount must be positive, got {}",
            amount
        )));
    }
    if method.trim().is_empty() {
        return Err(DomainError::Validation("payment method is required".into()));
    }
    Ok(())
}

fn derive_initial_payment_status(total_price: Decimal, payments: &[NewPayment]) -> PaymentStatus {
    let settled: Decimal = payments
        .iter()
        .filter(|p| p.status == PaymentRecordStatus::Settled)
        .map(|p| p.amount)
        .sum();
    if settled > Decimal::ZERO && settled >= total_price {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

fn count_row(line: &CustomerTypeLine, rate: &RateRow) -> NewCustomerTypeCount {
    NewCustomerTypeCount {
        customer_type_id: line.customer_type_id,
        rate_row_id: rate.id,
        count: line.count,
        unit_price: rate.price,
        duration_minutes: rate.duration_minutes,
    }
}

// ── Tests ──────────────────────────────────────────────────────
