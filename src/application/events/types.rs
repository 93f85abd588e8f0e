//! Dashboard notification events
//!
//! Published after a state change has been persisted. Subscribers use them to
//! refresh occupancy and billing views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ReservationCreated(ReservationCreatedEvent),
    ReservationStatusChanged(ReservationStatusChangedEvent),
    BarcodeCompleted(BarcodeCompletedEvent),
    ExtraTimeAdded(ExtraTimeAddedEvent),
    GuestWentOutside(OutsideMovementEvent),
    GuestCameBack(OutsideMovementEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationCreated(_) => "reservation_created",
            Event::ReservationStatusChanged(_) => "reservation_status_changed",
            Event::BarcodeCompleted(_) => "barcode_completed",
            Event::ExtraTimeAdded(_) => "extra_time_added",
            Event::GuestWentOutside(_) => "guest_went_outside",
            Event::GuestCameBack(_) => "guest_came_back",
        }
    }

    pub fn reservation_id(&self) -> i32 {
        match self {
            Event::ReservationCreated(e) => e.reservation_id,
            Event::ReservationStatusChanged(e) => e.reservation_id,
            Event::BarcodeCompleted(e) => e.reservation_id,
            Event::ExtraTimeAdded(e) => e.reservation_id,
            Event::GuestWentOutside(e) | Event::GuestCameBack(e) => e.reservation_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: i32,
    pub branch_id: i32,
    pub customer_id: i32,
    pub status: String,
    pub total_price: Decimal,
    pub barcode_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusChangedEvent {
    pub reservation_id: i32,
    pub old_status: String,
    pub new_status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeCompletedEvent {
    pub reservation_id: i32,
    pub barcode_id: i32,
    pub barcode_number: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraTimeAddedEvent {
    pub reservation_id: i32,
    pub barcode_id: i32,
    pub billed_minutes: i32,
    pub computed_total: Decimal,
    pub end_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutsideMovementEvent {
    pub reservation_id: i32,
    pub barcode_id: i32,
    pub track_id: i32,
    pub timestamp: DateTime<Utc>,
}

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(flatten)]
    pub event: Event,
    pub published_at: DateTime<Utc>,
}

impl EventMessage {
    pub fn new(event: Event, sequence: u64) -> Self {
        Self {
            id: format!("evt-{:08}", sequence),
            event,
            published_at: Utc::now(),
        }
    }
}
