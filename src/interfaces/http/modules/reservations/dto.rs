//! Reservation DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{CreateReservation, CustomerTypeLine, InitialPayment, RecordPayment};
use crate::domain::reservation::{CustomerTypeCount, Payment, PaymentRecordStatus};
use crate::domain::{Customer, Reservation, ReservationDetail};
use crate::interfaces::http::common::{money, ViewContext};
use crate::interfaces::http::modules::barcodes::BarcodeDto;

// ── Requests ────────────────────────────────────────────────────

/// One customer-type row of a booking. A zero count is allowed as long as
/// the booking has at least one guest overall.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerTypeLineRequest {
    #[validate(range(min = 1))]
    pub customer_type_id: i32,
    #[validate(range(min = 0, max = 500))]
    pub count: i32,
    /// Rate row priced for this branch and customer type
    #[validate(range(min = 1))]
    pub rate_row_id: i32,
    /// Pre-printed ticket numbers; generated when omitted
    #[serde(default)]
    pub barcode_numbers: Vec<String>,
}

/// Payment captured before the booking is submitted
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitialPaymentRequest {
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 32))]
    pub method: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    #[validate(range(min = 1))]
    pub branch_id: i32,
    #[validate(range(min = 1))]
    pub customer_id: i32,
    #[validate(length(min = 1), nested)]
    pub lines: Vec<CustomerTypeLineRequest>,
    #[validate(nested)]
    pub payment: Option<InitialPaymentRequest>,
}

impl From<CreateReservationRequest> for CreateReservation {
    fn from(r: CreateReservationRequest) -> Self {
        Self {
            branch_id: r.branch_id,
            customer_id: r.customer_id,
            lines: r
                .lines
                .into_iter()
                .map(|l| CustomerTypeLine {
                    customer_type_id: l.customer_type_id,
                    count: l.count,
                    rate_row_id: l.rate_row_id,
                    barcode_numbers: l.barcode_numbers,
                })
                .collect(),
            payment: r.payment.map(|p| InitialPayment {
                amount: p.amount,
                method: p.method,
            }),
        }
    }
}

/// Outcome of a payment attempt reported by the payment ledger
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentOutcome {
    Settled,
    Failed,
}

impl From<PaymentOutcome> for PaymentRecordStatus {
    fn from(o: PaymentOutcome) -> Self {
        match o {
            PaymentOutcome::Settled => Self::Settled,
            PaymentOutcome::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 32))]
    pub method: String,
    pub status: PaymentOutcome,
}

impl From<RecordPaymentRequest> for RecordPayment {
    fn from(r: RecordPaymentRequest) -> Self {
        Self {
            amount: r.amount,
            method: r.method,
            status: r.status.into(),
        }
    }
}

// ── Responses ───────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerTypeCountDto {
    pub customer_type_id: i32,
    pub rate_row_id: i32,
    pub count: i32,
    pub duration_minutes: i32,
    #[schema(value_type = String, example = "20.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "40.00")]
    pub subtotal: Decimal,
}

impl From<&CustomerTypeCount> for CustomerTypeCountDto {
    fn from(c: &CustomerTypeCount) -> Self {
        Self {
            customer_type_id: c.customer_type_id,
            rate_row_id: c.rate_row_id,
            count: c.count,
            duration_minutes: c.duration_minutes,
            unit_price: money(c.unit_price),
            subtotal: money(c.subtotal()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDto {
    pub id: i32,
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    pub method: String,
    /// SETTLED or FAILED
    pub status: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentDto {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id,
            amount: money(p.amount),
            method: p.method.clone(),
            status: p.status.as_str().to_string(),
            recorded_at: p.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDto {
    pub id: i32,
    pub name: String,
    pub mobile: Option<String>,
}

impl From<&Customer> for CustomerDto {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            mobile: c.mobile.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub id: i32,
    pub branch_id: i32,
    pub customer_id: i32,
    /// PENDING_PAYMENT, CONFIRMED, WENT_OUTSIDE, BACK_INSIDE, COMPLETED or CANCELLED
    pub status: String,
    /// PENDING, PAID or FAILED
    pub payment_status: String,
    #[schema(value_type = String, example = "40.00")]
    pub total_price: Decimal,
    #[schema(value_type = String, example = "40.00")]
    pub total_payment: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub balance_due: Decimal,
    pub guest_count: i32,
    pub created_date: DateTime<Utc>,
    pub counts: Vec<CustomerTypeCountDto>,
    pub payments: Vec<PaymentDto>,
}

impl From<&Reservation> for ReservationDto {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            branch_id: r.branch_id,
            customer_id: r.customer_id,
            status: r.status.as_str().to_string(),
            payment_status: r.payment_status.as_str().to_string(),
            total_price: money(r.total_price),
            total_payment: money(r.total_payment()),
            balance_due: money(r.balance_due()),
            guest_count: r.guest_count(),
            created_date: r.created_date,
            counts: r.counts.iter().map(CustomerTypeCountDto::from).collect(),
            payments: r.payments.iter().map(PaymentDto::from).collect(),
        }
    }
}

/// Reservation with customer and barcodes, as shown on the dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDetailDto {
    pub reservation: ReservationDto,
    pub customer: Option<CustomerDto>,
    pub barcodes: Vec<BarcodeDto>,
    /// Latest barcode end time; absent for cancelled reservations
    pub end_time: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "0.00")]
    pub total_extra_charges: Decimal,
}

impl ReservationDetailDto {
    pub fn from_domain(d: &ReservationDetail, view: ViewContext) -> Self {
        Self {
            reservation: ReservationDto::from(&d.reservation),
            customer: d.customer.as_ref().map(CustomerDto::from),
            barcodes: d
                .barcodes
                .iter()
                .map(|b| BarcodeDto::from_domain(b, view))
                .collect(),
            end_time: d.end_time(),
            total_extra_charges: money(d.total_extra_charges()),
        }
    }
}
