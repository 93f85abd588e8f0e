//! Barcode entry domain entity
//!
//! A barcode entry is one physical admission ticket. It owns an extra-time
//! ledger and an outside-tracker; its end time is always derived from them.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;

use crate::domain::rate::RateRow;
use crate::domain::{DomainError, DomainResult};

/// Barcode status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeStatus {
    Pending,
    Completed,
}

impl BarcodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BarcodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the quantity of an extra-time charge affects the admitted minutes.
///
/// `PerCharge` adds the rate row's minutes once per charge and uses quantity
/// purely as a price multiplier. `PerUnit` adds `minutes × quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraMinutesPolicy {
    #[default]
    PerCharge,
    PerUnit,
}

impl ExtraMinutesPolicy {
    pub fn billed_minutes(&self, additional_minutes: i32, quantity: i32) -> i32 {
        match self {
            Self::PerCharge => additional_minutes,
            Self::PerUnit => additional_minutes.saturating_mul(quantity),
        }
    }
}

/// Priced extra-time request, computed from a single rate row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraTimeQuote {
    pub rate_row_id: i32,
    pub additional_minutes: i32,
    pub billed_minutes: i32,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub computed_total: Decimal,
}

impl ExtraTimeQuote {
    pub fn new(rate: &RateRow, quantity: i32, policy: ExtraMinutesPolicy) -> DomainResult<Self> {
        if quantity < 1 {
            return Err(DomainError::Validation(format!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }
        if rate.duration_minutes <= 0 {
            return Err(DomainError::Validation(format!(
                "rate row {} has no duration and cannot be billed as extra time",
                rate.id
            )));
        }

        Ok(Self {
            rate_row_id: rate.id,
            additional_minutes: rate.duration_minutes,
            billed_minutes: policy.billed_minutes(rate.duration_minutes, quantity),
            unit_price: rate.price,
            quantity,
            computed_total: rate.price * Decimal::from(quantity),
        })
    }
}

/// A billed addition of admission minutes
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraTimeCharge {
    pub id: i32,
    pub barcode_id: i32,
    pub rate_row_id: i32,
    /// Minutes of the rate row
    pub additional_minutes: i32,
    /// Minutes actually added to the end time under the policy in force
    pub billed_minutes: i32,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub computed_total: Decimal,
    pub applied_at: DateTime<Utc>,
}

/// Exit/return pair
#[derive(Debug, Clone, PartialEq)]
pub struct OutsideTrackEntry {
    pub id: i32,
    pub barcode_id: i32,
    pub out_at: DateTime<Utc>,
    pub in_at: Option<DateTime<Utc>>,
}

impl OutsideTrackEntry {
    pub fn is_open(&self) -> bool {
        self.in_at.is_none()
    }

    /// Exit time as venue-local hour/minute.
    pub fn out_time(&self, offset: FixedOffset) -> NaiveTime {
        wall_clock(self.out_at, offset)
    }

    /// Return time as venue-local hour/minute, if the guest is back.
    pub fn in_time(&self, offset: FixedOffset) -> Option<NaiveTime> {
        self.in_at.map(|at| wall_clock(at, offset))
    }

    /// Minutes spent outside so far (open entries count up to `now`).
    pub fn minutes_outside(&self, now: DateTime<Utc>) -> i64 {
        let until = self.in_at.unwrap_or(now);
        (until - self.out_at).num_minutes().max(0)
    }
}

fn wall_clock(at: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    let local = at.with_timezone(&offset).time();
    NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local)
}

/// One physical admission ticket
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeEntry {
    pub id: i32,
    pub reservation_id: i32,
    pub barcode_number: String,
    pub customer_type_id: i32,
    /// Duration purchased at booking time
    pub initial_minutes: i32,
    pub status: BarcodeStatus,
    /// Admission time
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub extra_time: Vec<ExtraTimeCharge>,
    pub outside_tracks: Vec<OutsideTrackEntry>,
}

impl BarcodeEntry {
    pub fn is_completed(&self) -> bool {
        self.status == BarcodeStatus::Completed
    }

    pub fn total_extra_minutes(&self) -> i64 {
        self.extra_time.iter().map(|c| c.billed_minutes as i64).sum()
    }

    pub fn total_extra_charges(&self) -> Decimal {
        self.extra_time.iter().map(|c| c.computed_total).sum()
    }

    /// `created_at + initial_minutes + Σ billed extra minutes`
    pub fn end_time(&self) -> DateTime<Utc> {
        self.created_at
            + Duration::minutes(self.initial_minutes as i64)
            + Duration::minutes(self.total_extra_minutes())
    }

    /// Whole minutes left before `end_time`; negative once overdue.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        (self.end_time() - now).num_minutes()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && now > self.end_time()
    }

    pub fn open_outside_track(&self) -> Option<&OutsideTrackEntry> {
        self.outside_tracks.iter().find(|t| t.is_open())
    }

    pub fn is_outside(&self) -> bool {
        self.open_outside_track().is_some()
    }

    pub fn minutes_outside(&self, now: DateTime<Utc>) -> i64 {
        self.outside_tracks
            .iter()
            .map(|t| t.minutes_outside(now))
            .sum()
    }

    pub fn ensure_open(&self) -> DomainResult<()> {
        if self.is_completed() {
            return Err(DomainError::BarcodeClosed(self.id));
        }
        Ok(())
    }

    /// Mark the ticket as used up. Returns `false` when it already was,
    /// leaving `completed_at` untouched.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = BarcodeStatus::Completed;
        self.completed_at = Some(at);
        true
    }

    pub fn apply_extra_time(
        &mut self,
        charge_id: i32,
        quote: &ExtraTimeQuote,
        at: DateTime<Utc>,
    ) -> DomainResult<&ExtraTimeCharge> {
        self.ensure_open()?;

        self.extra_time.push(ExtraTimeCharge {
            id: charge_id,
            barcode_id: self.id,
            rate_row_id: quote.rate_row_id,
            additional_minutes: quote.additional_minutes,
            billed_minutes: quote.billed_minutes,
            unit_price: quote.unit_price,
            quantity: quote.quantity,
            computed_total: quote.computed_total,
            applied_at: at,
        });
        Ok(&self.extra_time[self.extra_time.len() - 1])
    }

    pub fn go_outside(
        &mut self,
        track_id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<&OutsideTrackEntry> {
        self.ensure_open()?;
        if self.is_outside() {
            return Err(DomainError::AlreadyOutside(self.id));
        }

        self.outside_tracks.push(OutsideTrackEntry {
            id: track_id,
            barcode_id: self.id,
            out_at: at,
            in_at: None,
        });
        Ok(&self.outside_tracks[self.outside_tracks.len() - 1])
    }

    pub fn come_inside(&mut self, at: DateTime<Utc>) -> DomainResult<&OutsideTrackEntry> {
        self.ensure_open()?;
        let id = self.id;
        let track = self
            .outside_tracks
            .iter_mut()
            .find(|t| t.is_open())
            .ok_or(DomainError::NotOutside(id))?;
        track.in_at = Some(at);
        Ok(track)
    }
}

/// Barcode as requested at booking time, before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBarcodeEntry {
    /// Pre-printed ticket number; generated when `None`
    pub barcode_number: Option<String>,
    pub customer_type_id: i32,
    pub initial_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// `<prefix><reservation id:06>-<seq:03>`, e.g. `B000042-001`.
///
/// The separator keeps numbers distinct once an id outgrows its padding.
pub fn generate_barcode_number(prefix: &str, reservation_id: i32, seq: usize) -> String {
    format!("{}{:06}-{:03}", prefix, reservation_id, seq)
}

/// Final ticket numbers for a new reservation's barcodes, in order.
/// Rejects a batch that would hand the same number out twice.
pub fn assign_barcode_numbers(
    prefix: &str,
    reservation_id: i32,
    barcodes: &[NewBarcodeEntry],
) -> DomainResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(barcodes.len());
    let mut numbers = Vec::with_capacity(barcodes.len());
    for (seq, b) in barcodes.iter().enumerate() {
        let number = b
            .barcode_number
            .clone()
            .unwrap_or_else(|| generate_barcode_number(prefix, reservation_id, seq + 1));
        if !seen.insert(number.clone()) {
            return Err(DomainError::Validation(format!(
                "barcode number {} is repeated",
                number
            )));
        }
        numbers.push(number);
    }
    Ok(numbers)
}

/// True when `number` has the shape of a generated number for `prefix`.
/// Pre-printed tickets may not use it.
pub fn is_generated_number(prefix: &str, number: &str) -> bool {
    let Some(rest) = number.strip_prefix(prefix) else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match rest.split_once('-') {
        Some((id, seq)) => all_digits(id) && all_digits(seq),
        None => false,
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn sample_barcode() -> BarcodeEntry {
        BarcodeEntry {
            id: 1,
            reservation_id: 10,
            barcode_number: "B000010-001".into(),
            customer_type_id: 1,
            initial_minutes: 60,
            status: BarcodeStatus::Pending,
            created_at: at(13, 0),
            completed_at: None,
            extra_time: vec![],
            outside_tracks: vec![],
        }
    }

    fn rate(minutes: i32, price: i64) -> RateRow {
        RateRow {
            id: 5,
            branch_id: 1,
            customer_type_id: 1,
            duration_minutes: minutes,
            price: Decimal::from(price),
        }
    }

    #[test]
    fn end_time_is_admission_plus_initial_minutes() {
        let b = sample_barcode();
        assert_eq!(b.end_time(), at(14, 0));
        assert_eq!(b.remaining_minutes(at(13, 30)), 30);
        assert!(!b.is_overdue(at(13, 59)));
        assert!(b.is_overdue(at(14, 1)));
    }

    #[test]
    fn extra_time_moves_end_time() {
        let mut b = sample_barcode();
        let quote = ExtraTimeQuote::new(&rate(30, 5), 1, ExtraMinutesPolicy::PerCharge).unwrap();
        b.apply_extra_time(1, &quote, at(13, 50)).unwrap();
        assert_eq!(b.end_time(), at(14, 30));
        assert_eq!(b.total_extra_charges(), Decimal::from(5));
    }

    #[test]
    fn per_charge_policy_multiplies_price_only() {
        let quote = ExtraTimeQuote::new(&rate(30, 5), 3, ExtraMinutesPolicy::PerCharge).unwrap();
        assert_eq!(quote.computed_total, Decimal::from(15));
        assert_eq!(quote.billed_minutes, 30);
    }

    #[test]
    fn per_unit_policy_multiplies_minutes_too() {
        let quote = ExtraTimeQuote::new(&rate(30, 5), 3, ExtraMinutesPolicy::PerUnit).unwrap();
        assert_eq!(quote.computed_total, Decimal::from(15));
        assert_eq!(quote.billed_minutes, 90);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = ExtraTimeQuote::new(&rate(30, 5), 0, ExtraMinutesPolicy::PerCharge).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn complete_is_idempotent() {
        let mut b = sample_barcode();
        assert!(b.complete(at(14, 0)));
        assert!(!b.complete(at(15, 0)));
        assert_eq!(b.completed_at, Some(at(14, 0)));
        assert_eq!(b.status, BarcodeStatus::Completed);
    }

    #[test]
    fn completed_barcode_rejects_changes() {
        let mut b = sample_barcode();
        b.complete(at(14, 0));
        let quote = ExtraTimeQuote::new(&rate(30, 5), 1, ExtraMinutesPolicy::PerCharge).unwrap();
        assert_eq!(
            b.apply_extra_time(1, &quote, at(14, 1)).unwrap_err(),
            DomainError::BarcodeClosed(1)
        );
        assert_eq!(b.go_outside(1, at(14, 1)).unwrap_err(), DomainError::BarcodeClosed(1));
        assert_eq!(b.come_inside(at(14, 1)).unwrap_err(), DomainError::BarcodeClosed(1));
    }

    #[test]
    fn outside_then_inside_closes_single_entry() {
        let mut b = sample_barcode();
        b.go_outside(1, at(14, 0)).unwrap();
        assert!(b.is_outside());
        assert_eq!(b.go_outside(2, at(14, 10)).unwrap_err(), DomainError::AlreadyOutside(1));

        let track = b.come_inside(at(14, 45)).unwrap().clone();
        assert_eq!(track.out_time(FixedOffset::east_opt(0).unwrap()).to_string(), "14:00:00");
        assert_eq!(
            track.in_time(FixedOffset::east_opt(0).unwrap()).unwrap().to_string(),
            "14:45:00"
        );
        assert_eq!(b.outside_tracks.len(), 1);
        assert!(!b.is_outside());
        assert_eq!(b.minutes_outside(at(16, 0)), 45);
    }

    #[test]
    fn inside_without_outside_fails() {
        let mut b = sample_barcode();
        assert_eq!(b.come_inside(at(14, 0)).unwrap_err(), DomainError::NotOutside(1));
    }

    #[test]
    fn wall_clock_respects_venue_offset() {
        let track = OutsideTrackEntry {
            id: 1,
            barcode_id: 1,
            out_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 42).unwrap(),
            in_at: None,
        };
        let tashkent = FixedOffset::east_opt(5 * 3600).unwrap();
        assert_eq!(track.out_time(tashkent).to_string(), "14:30:00");
        assert!(track.in_time(tashkent).is_none());
    }

    #[test]
    fn generated_numbers_are_padded() {
        assert_eq!(generate_barcode_number("B", 42, 1), "B000042-001");
        assert_eq!(generate_barcode_number("B", 42, 421), "B000042-421");
    }

    #[test]
    fn large_ids_and_sequences_stay_distinct() {
        let a = generate_barcode_number("B", 100_000, 421);
        let b = generate_barcode_number("B", 1_000_004, 21);
        assert_ne!(a, b);
        assert_eq!(generate_barcode_number("B", 1_234_567, 1), "B1234567-001");
    }

    #[test]
    fn assigned_numbers_mix_supplied_and_generated() {
        let entry = |n: Option<&str>| NewBarcodeEntry {
            barcode_number: n.map(str::to_string),
            customer_type_id: 1,
            initial_minutes: 60,
            created_at: at(13, 0),
        };
        let numbers =
            assign_barcode_numbers("B", 5, &[entry(None), entry(Some("T-1")), entry(None)]).unwrap();
        assert_eq!(numbers, vec!["B000005-001", "T-1", "B000005-003"]);

        assert!(matches!(
            assign_barcode_numbers("B", 5, &[entry(Some("T-1")), entry(Some("T-1"))]),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn recognises_generated_shape() {
        assert!(is_generated_number("B", "B000003-001"));
        assert!(is_generated_number("B", &generate_barcode_number("B", 7, 12)));
        assert!(!is_generated_number("B", "B00000301"));
        assert!(!is_generated_number("B", "T-1"));
        assert!(!is_generated_number("B", "B-001"));
        assert!(!is_generated_number("PLAY", "B000003-001"));
    }
}
