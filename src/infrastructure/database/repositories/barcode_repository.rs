//! SeaORM implementation of BarcodeRepository
//!
//! Every mutating call opens a transaction whose first statement is a
//! guarded `UPDATE barcode_entries SET version = version + 1 WHERE id = ?
//! AND status = 'PENDING'`. That statement takes the row's write lock, so
//! dependent reads and inserts in the same transaction see a stable barcode.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{corrupt, db_err};
use crate::domain::barcode::{
    BarcodeEntry, BarcodeRepository, BarcodeStatus, ExtraTimeCharge, ExtraTimeQuote,
    OutsideTrackEntry,
};
use crate::domain::money::{from_minor_units, to_minor_units};
use crate::domain::reservation::ReservationStatus;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{
    barcode_entry, extra_time_charge, outside_track_entry, reservation,
};

pub struct SeaOrmBarcodeRepository {
    db: DatabaseConnection,
}

impl SeaOrmBarcodeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn charge_to_domain(m: extra_time_charge::Model) -> ExtraTimeCharge {
    ExtraTimeCharge {
        id: m.id,
        barcode_id: m.barcode_id,
        rate_row_id: m.rate_row_id,
        additional_minutes: m.additional_minutes,
        billed_minutes: m.billed_minutes,
        unit_price: from_minor_units(m.unit_price),
        quantity: m.quantity,
        computed_total: from_minor_units(m.computed_total),
        applied_at: m.applied_at,
    }
}

fn track_to_domain(m: outside_track_entry::Model) -> OutsideTrackEntry {
    OutsideTrackEntry {
        id: m.id,
        barcode_id: m.barcode_id,
        out_at: m.out_at,
        in_at: m.in_at,
    }
}

fn model_to_domain(
    m: barcode_entry::Model,
    extra_time: Vec<ExtraTimeCharge>,
    outside_tracks: Vec<OutsideTrackEntry>,
) -> DomainResult<BarcodeEntry> {
    let status = BarcodeStatus::from_str(&m.status)
        .ok_or_else(|| corrupt("BarcodeEntry", "status", &m.status))?;
    Ok(BarcodeEntry {
        id: m.id,
        reservation_id: m.reservation_id,
        barcode_number: m.barcode_number,
        customer_type_id: m.customer_type_id,
        initial_minutes: m.initial_minutes,
        status,
        created_at: m.created_at,
        completed_at: m.completed_at,
        extra_time,
        outside_tracks,
    })
}

/// Attach ledgers and trackers to a batch of barcode rows.
async fn load_entries<C: ConnectionTrait>(
    db: &C,
    models: Vec<barcode_entry::Model>,
) -> DomainResult<Vec<BarcodeEntry>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut charges: HashMap<i32, Vec<ExtraTimeCharge>> = HashMap::new();
    for m in extra_time_charge::Entity::find()
        .filter(extra_time_charge::Column::BarcodeId.is_in(ids.clone()))
        .order_by_asc(extra_time_charge::Column::Id)
        .all(db)
        .await
        .map_err(db_err)?
    {
        charges.entry(m.barcode_id).or_default().push(charge_to_domain(m));
    }

    let mut tracks: HashMap<i32, Vec<OutsideTrackEntry>> = HashMap::new();
    for m in outside_track_entry::Entity::find()
        .filter(outside_track_entry::Column::BarcodeId.is_in(ids))
        .order_by_asc(outside_track_entry::Column::Id)
        .all(db)
        .await
        .map_err(db_err)?
    {
        tracks.entry(m.barcode_id).or_default().push(track_to_domain(m));
    }

    models
        .into_iter()
        .map(|m| {
            let extra = charges.remove(&m.id).unwrap_or_default();
            let outside = tracks.remove(&m.id).unwrap_or_default();
            model_to_domain(m, extra, outside)
        })
        .collect()
}

/// Bump the version of a PENDING barcode. Zero affected rows means the
/// barcode is missing or completed; tell the two apart.
async fn guard_pending<C: ConnectionTrait>(db: &C, id: i32) -> DomainResult<()> {
    let result = barcode_entry::Entity::update_many()
        .col_expr(
            barcode_entry::Column::Version,
            Expr::col(barcode_entry::Column::Version).add(1),
        )
        .filter(barcode_entry::Column::Id.eq(id))
        .filter(barcode_entry::Column::Status.eq(BarcodeStatus::Pending.as_str()))
        .exec(db)
        .await
        .map_err(db_err)?;
    if result.rows_affected > 0 {
        return Ok(());
    }

    match barcode_entry::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(db_err)?
    {
        Some(_) => Err(DomainError::BarcodeClosed(id)),
        None => Err(DomainError::not_found("BarcodeEntry", "id", id)),
    }
}

/// First of `numbers` held by a PENDING barcode of a non-terminal reservation.
pub(super) async fn first_number_in_use<C: ConnectionTrait>(
    db: &C,
    numbers: &[String],
) -> DomainResult<Option<String>> {
    if numbers.is_empty() {
        return Ok(None);
    }
    let pending = barcode_entry::Entity::find()
        .filter(barcode_entry::Column::BarcodeNumber.is_in(numbers.to_vec()))
        .filter(barcode_entry::Column::Status.eq(BarcodeStatus::Pending.as_str()))
        .all(db)
        .await
        .map_err(db_err)?;
    if pending.is_empty() {
        return Ok(None);
    }

    let reservation_ids: Vec<i32> = pending.iter().map(|m| m.reservation_id).collect();
    let live: HashSet<i32> = reservation::Entity::find()
        .filter(reservation::Column::Id.is_in(reservation_ids))
        .filter(reservation::Column::Status.is_not_in([
            ReservationStatus::Completed.as_str(),
            ReservationStatus::Cancelled.as_str(),
        ]))
        .all(db)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|m| m.id)
        .collect();

    Ok(numbers
        .iter()
        .find(|n| {
            pending
                .iter()
                .any(|m| &m.barcode_number == *n && live.contains(&m.reservation_id))
        })
        .cloned())
}

// ── BarcodeRepository impl ──────────────────────────────────────

#[async_trait]
impl BarcodeRepository for SeaOrmBarcodeRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BarcodeEntry>> {
        let Some(model) = barcode_entry::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(load_entries(&self.db, vec![model]).await?.pop())
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Vec<BarcodeEntry>> {
        let models = barcode_entry::Entity::find()
            .filter(barcode_entry::Column::ReservationId.eq(reservation_id))
            .order_by_asc(barcode_entry::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        load_entries(&self.db, models).await
    }

    async fn find_by_number(&self, barcode_number: &str) -> DomainResult<Vec<BarcodeEntry>> {
        let models = barcode_entry::Entity::find()
            .filter(barcode_entry::Column::BarcodeNumber.eq(barcode_number))
            .order_by_asc(barcode_entry::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        load_entries(&self.db, models).await
    }

    async fn is_number_in_use(&self, barcode_number: &str) -> DomainResult<bool> {
        let taken = first_number_in_use(&self.db, &[barcode_number.to_string()]).await?;
        Ok(taken.is_some())
    }

    async fn complete_if_pending(&self, id: i32, at: DateTime<Utc>) -> DomainResult<bool> {
        debug!("Completing barcode {}", id);

        let result = barcode_entry::Entity::update_many()
            .col_expr(
                barcode_entry::Column::Status,
                Expr::value(BarcodeStatus::Completed.as_str()),
            )
            .col_expr(barcode_entry::Column::CompletedAt, Expr::value(at))
            .col_expr(
                barcode_entry::Column::Version,
                Expr::col(barcode_entry::Column::Version).add(1),
            )
            .filter(barcode_entry::Column::Id.eq(id))
            .filter(barcode_entry::Column::Status.eq(BarcodeStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected > 0 {
            return Ok(true);
        }

        let exists = barcode_entry::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        match exists {
            Some(_) => Ok(false),
            None => Err(DomainError::not_found("BarcodeEntry", "id", id)),
        }
    }

    async fn append_extra_time(
        &self,
        id: i32,
        quote: &ExtraTimeQuote,
        at: DateTime<Utc>,
    ) -> DomainResult<ExtraTimeCharge> {
        debug!("Appending extra time to barcode {}: {} min", id, quote.billed_minutes);

        let txn = self.db.begin().await.map_err(db_err)?;
        guard_pending(&txn, id).await?;

        let model = extra_time_charge::ActiveModel {
            id: NotSet,
            barcode_id: Set(id),
            rate_row_id: Set(quote.rate_row_id),
            additional_minutes: Set(quote.additional_minutes),
            billed_minutes: Set(quote.billed_minutes),
            unit_price: Set(to_minor_units(quote.unit_price)?),
            quantity: Set(quote.quantity),
            computed_total: Set(to_minor_units(quote.computed_total)?),
            applied_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(charge_to_domain(model))
    }

    async fn open_outside_track(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<OutsideTrackEntry> {
        debug!("Opening outside track for barcode {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;
        guard_pending(&txn, id).await?;

        let open = outside_track_entry::Entity::find()
            .filter(outside_track_entry::Column::BarcodeId.eq(id))
            .filter(outside_track_entry::Column::InAt.is_null())
            .one(&txn)
            .await
            .map_err(db_err)?;
        if open.is_some() {
            return Err(DomainError::AlreadyOutside(id));
        }

        let model = outside_track_entry::ActiveModel {
            id: NotSet,
            barcode_id: Set(id),
            out_at: Set(at),
            in_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(track_to_domain(model))
    }

    async fn close_outside_track(
        &self,
        id: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<OutsideTrackEntry> {
        debug!("Closing outside track for barcode {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;
        guard_pending(&txn, id).await?;

        let open = outside_track_entry::Entity::find()
            .filter(outside_track_entry::Column::BarcodeId.eq(id))
            .filter(outside_track_entry::Column::InAt.is_null())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotOutside(id))?;

        let mut active: outside_track_entry::ActiveModel = open.into();
        active.in_at = Set(Some(at));
        let model = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(track_to_domain(model))
    }
}
