//! Barcode DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::ExtraTimeReceipt;
use crate::domain::{BarcodeEntry, ExtraTimeCharge, OutsideTrackEntry};
use crate::interfaces::http::common::{money, ViewContext};

const WALL_CLOCK: &str = "%H:%M";

/// Extra-time ledger entry
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtraTimeChargeDto {
    pub id: i32,
    pub rate_row_id: i32,
    /// Duration of the rate row
    pub additional_minutes: i32,
    /// Minutes actually added to the barcode's end time
    pub billed_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "5.00")]
    pub computed_total: Decimal,
    pub applied_at: DateTime<Utc>,
}

impl From<&ExtraTimeCharge> for ExtraTimeChargeDto {
    fn from(c: &ExtraTimeCharge) -> Self {
        Self {
            id: c.id,
            rate_row_id: c.rate_row_id,
            additional_minutes: c.additional_minutes,
            billed_minutes: c.billed_minutes,
            unit_price: money(c.unit_price),
            quantity: c.quantity,
            computed_total: money(c.computed_total),
            applied_at: c.applied_at,
        }
    }
}

/// Outside-tracker entry with venue-local wall-clock times
#[derive(Debug, Serialize, ToSchema)]
pub struct OutsideTrackDto {
    pub id: i32,
    pub out_at: DateTime<Utc>,
    pub in_at: Option<DateTime<Utc>>,
    /// `HH:MM` in venue time
    #[schema(example = "14:00")]
    pub out_time: String,
    #[schema(example = "14:45")]
    pub in_time: Option<String>,
    pub minutes_outside: i64,
}

impl OutsideTrackDto {
    pub fn from_domain(t: &OutsideTrackEntry, view: ViewContext) -> Self {
        Self {
            id: t.id,
            out_at: t.out_at,
            in_at: t.in_at,
            out_time: t.out_time(view.offset).format(WALL_CLOCK).to_string(),
            in_time: t
                .in_time(view.offset)
                .map(|time| time.format(WALL_CLOCK).to_string()),
            minutes_outside: t.minutes_outside(view.now),
        }
    }
}

/// Barcode entry with its ledger, tracker and computed times
#[derive(Debug, Serialize, ToSchema)]
pub struct BarcodeDto {
    pub id: i32,
    pub reservation_id: i32,
    pub barcode_number: String,
    pub customer_type_id: i32,
    /// PENDING or COMPLETED
    pub status: String,
    pub initial_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub remaining_minutes: i64,
    pub is_overdue: bool,
    pub is_outside: bool,
    pub minutes_outside: i64,
    pub total_extra_minutes: i64,
    #[schema(value_type = String, example = "0.00")]
    pub total_extra_charges: Decimal,
    pub extra_time: Vec<ExtraTimeChargeDto>,
    pub outside_tracks: Vec<OutsideTrackDto>,
}

impl BarcodeDto {
    pub fn from_domain(b: &BarcodeEntry, view: ViewContext) -> Self {
        Self {
            id: b.id,
            reservation_id: b.reservation_id,
            barcode_number: b.barcode_number.clone(),
            customer_type_id: b.customer_type_id,
            status: b.status.as_str().to_string(),
            initial_minutes: b.initial_minutes,
            created_at: b.created_at,
            completed_at: b.completed_at,
            end_time: b.end_time(),
            remaining_minutes: b.remaining_minutes(view.now),
            is_overdue: b.is_overdue(view.now),
            is_outside: b.is_outside(),
            minutes_outside: b.minutes_outside(view.now),
            total_extra_minutes: b.total_extra_minutes(),
            total_extra_charges: money(b.total_extra_charges()),
            extra_time: b.extra_time.iter().map(ExtraTimeChargeDto::from).collect(),
            outside_tracks: b
                .outside_tracks
                .iter()
                .map(|t| OutsideTrackDto::from_domain(t, view))
                .collect(),
        }
    }
}

/// Request to extend one barcode's play time
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddExtraTimeRequest {
    /// Rate row providing the extra duration and price
    #[validate(range(min = 1))]
    pub rate_row_id: i32,
    /// Multiplies the price (and, under the per-unit policy, the minutes)
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 100))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Result of adding extra time
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtraTimeReceiptDto {
    pub barcode_id: i32,
    pub charge: ExtraTimeChargeDto,
    /// New end time of the barcode
    pub end_time: DateTime<Utc>,
    #[schema(value_type = String, example = "5.00")]
    pub computed_total: Decimal,
}

impl From<&ExtraTimeReceipt> for ExtraTimeReceiptDto {
    fn from(r: &ExtraTimeReceipt) -> Self {
        Self {
            barcode_id: r.barcode_id,
            charge: ExtraTimeChargeDto::from(&r.charge),
            end_time: r.end_time,
            computed_total: money(r.computed_total),
        }
    }
}
