//! Scan resolution
//!
//! Maps a scanned barcode or mobile number to the admitted, paid
//! reservations it belongs to.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::load_detail;
use crate::domain::scan::ScanQuery;
use crate::domain::{DomainResult, PaymentStatus, RepositoryProvider, ReservationDetail};

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Blank input; the caller clears its search state
    Reset,
    /// Matching reservations, newest first. Empty when nothing matches.
    Matches(Vec<ReservationDetail>),
}

impl ScanOutcome {
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }

    pub fn matches(&self) -> &[ReservationDetail] {
        match self {
            Self::Reset => &[],
            Self::Matches(found) => found,
        }
    }
}

pub struct ScanService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ScanService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// `resolveScan(scannedValue)`
    pub async fn resolve(&self, scanned: &str) -> DomainResult<ScanOutcome> {
        let query = ScanQuery::classify(scanned);
        let reservation_ids: BTreeSet<i32> = match &query {
            ScanQuery::Reset => {
                debug!("Blank scan, resetting search");
                return Ok(ScanOutcome::Reset);
            }
            ScanQuery::Mobile(digits) => {
                let customers = self.repos.customers().find_by_mobile(digits).await?;
                let ids: Vec<i32> = customers.iter().map(|c| c.id).collect();
                if ids.is_empty() {
                    BTreeSet::new()
                } else {
                    self.repos
                        .reservations()
                        .find_by_customers(&ids)
                        .await?
                        .into_iter()
                        .map(|r| r.id)
                        .collect()
                }
            }
            ScanQuery::Barcode(number) => self
                .repos
                .barcodes()
                .find_by_number(number)
                .await?
                .into_iter()
                .map(|b| b.reservation_id)
                .collect(),
        };

        let mut found = Vec::new();
        for id in reservation_ids.into_iter().rev() {
            let Some(reservation) = self.repos.reservations().find_by_id(id).await? else {
                continue;
            };
            let detail = load_detail(self.repos.as_ref(), reservation).await?;
            if detail.reservation.status.is_admitted()
                && detail.reservation.payment_status == PaymentStatus::Paid
            {
                found.push(detail);
            }
        }

        let kind = match query {
            ScanQuery::Mobile(_) => "mobile",
            _ => "barcode",
        };
        info!(kind, matches = found.len(), "Scan resolved");
        metrics::counter!("scans_total", "kind" => kind).increment(1);
        Ok(ScanOutcome::Matches(found))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::SessionEngine;
    use crate::application::services::test_support::*;
    use crate::application::services::{CreateReservation, CustomerTypeLine, InitialPayment};
    use rust_decimal::Decimal;

    async fn book(engine: &SessionEngine, number: &str, paid: bool) -> ReservationDetail {
        engine
            .create_reservation(CreateReservation {
                branch_id: BRANCH,
                customer_id: CUSTOMER,
                lines: vec![CustomerTypeLine {
                    customer_type_id: ADULT,
                    count: 1,
                    rate_row_id: ADULT_60,
                    barcode_numbers: vec![number.to_string()],
                }],
                payment: paid.then(|| InitialPayment {
                    amount: Decimal::from(20),
                    method: "card".into(),
                }),
            })
            .await
            .unwrap()
    }

    fn ids(outcome: &ScanOutcome) -> Vec<i32> {
        outcome.matches().iter().map(|d| d.reservation.id).collect()
    }

    #[tokio::test]
    async fn barcode_and_mobile_resolve_to_same_reservation() {
        let (engine, _clock) = engine_at(t(13, 0));
        let r = book(&engine, "B123", true).await;

        let by_barcode = engine.resolve_scan("B123").await.unwrap();
        assert_eq!(ids(&by_barcode), vec![r.reservation.id]);

        let by_mobile = engine.resolve_scan("19995551234").await.unwrap();
        assert_eq!(ids(&by_mobile), vec![r.reservation.id]);

        let international = engine.resolve_scan("+19995551234").await.unwrap();
        assert_eq!(ids(&international), vec![r.reservation.id]);

        let detail = &by_barcode.matches()[0];
        assert_eq!(detail.barcodes.len(), 1);
        assert_eq!(detail.barcodes[0].barcode_number, "B123");
    }

    #[tokio::test]
    async fn blank_scan_resets_without_lookup() {
        let (engine, _clock) = engine_at(t(13, 0));
        book(&engine, "B123", true).await;
        assert!(engine.resolve_scan("").await.unwrap().is_reset());
        assert!(engine.resolve_scan("  ").await.unwrap().is_reset());
    }

    #[tokio::test]
    async fn unknown_value_is_empty_not_error() {
        let (engine, _clock) = engine_at(t(13, 0));
        let outcome = engine.resolve_scan("B999").await.unwrap();
        assert_eq!(outcome, ScanOutcome::Matches(vec![]));
        let outcome = engine.resolve_scan("+449995550000").await.unwrap();
        assert!(outcome.matches().is_empty());
    }

    #[tokio::test]
    async fn unpaid_and_finished_reservations_are_excluded() {
        let (engine, _clock) = engine_at(t(13, 0));
        let unpaid = book(&engine, "B200", false).await;
        let done = book(&engine, "B300", true).await;
        engine.confirm_all_barcodes(done.reservation.id).await.unwrap();
        let live = book(&engine, "B400", true).await;

        assert!(engine.resolve_scan("B200").await.unwrap().matches().is_empty());
        assert!(engine.resolve_scan("B300").await.unwrap().matches().is_empty());
        let by_mobile = engine.resolve_scan("19995551234").await.unwrap();
        assert_eq!(ids(&by_mobile), vec![live.reservation.id]);
        assert!(!ids(&by_mobile).contains(&unpaid.reservation.id));
    }

    #[tokio::test]
    async fn outside_guests_are_still_found() {
        let (engine, _clock) = engine_at(t(13, 0));
        let r = book(&engine, "B500", true).await;
        engine.mark_outside(r.barcodes[0].id).await.unwrap();
        let outcome = engine.resolve_scan("B500").await.unwrap();
        assert_eq!(ids(&outcome), vec![r.reservation.id]);
        assert!(outcome.matches()[0].barcodes[0].is_outside());
    }
}
