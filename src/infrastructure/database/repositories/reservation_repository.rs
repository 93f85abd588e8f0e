//! SeaORM implementation of ReservationRepository

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::barcode_repository::first_number_in_use;
use super::{corrupt, db_err};
use crate::domain::barcode::{assign_barcode_numbers, BarcodeStatus};
use crate::domain::money::{from_minor_units, to_minor_units};
use crate::domain::reservation::{
    CustomerTypeCount, NewPayment, NewReservation, Payment, PaymentRecordStatus, PaymentStatus,
    Reservation, ReservationRepository, ReservationStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{
    barcode_entry, reservation, reservation_customer_count, reservation_payment,
};

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn count_to_domain(m: reservation_customer_count::Model) -> CustomerTypeCount {
    CustomerTypeCount {
        id: m.id,
        customer_type_id: m.customer_type_id,
        rate_row_id: m.rate_row_id,
        count: m.count,
        unit_price: from_minor_units(m.unit_price),
        duration_minutes: m.duration_minutes,
    }
}

fn payment_to_domain(m: reservation_payment::Model) -> DomainResult<Payment> {
    let status = PaymentRecordStatus::from_str(&m.status)
        .ok_or_else(|| corrupt("Payment", "status", &m.status))?;
    Ok(Payment {
        id: m.id,
        reservation_id: m.reservation_id,
        amount: from_minor_units(m.amount),
        method: m.method,
        status,
        recorded_at: m.recorded_at,
    })
}

fn model_to_domain(
    m: reservation::Model,
    counts: Vec<CustomerTypeCount>,
    payments: Vec<Payment>,
) -> DomainResult<Reservation> {
    let status = ReservationStatus::from_str(&m.status)
        .ok_or_else(|| corrupt("Reservation", "status", &m.status))?;
    let payment_status = PaymentStatus::from_str(&m.payment_status)
        .ok_or_else(|| corrupt("Reservation", "payment_status", &m.payment_status))?;
    Ok(Reservation {
        id: m.id,
        branch_id: m.branch_id,
        customer_id: m.customer_id,
        status,
        payment_status,
        total_price: from_minor_units(m.total_price),
        created_date: m.created_date,
        counts,
        payments,
    })
}

/// Attach counts and payments to a batch of reservation rows.
async fn load_reservations<C: ConnectionTrait>(
    db: &C,
    models: Vec<reservation::Model>,
) -> DomainResult<Vec<Reservation>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut counts: HashMap<i32, Vec<CustomerTypeCount>> = HashMap::new();
    for m in reservation_customer_count::Entity::find()
        .filter(reservation_customer_count::Column::ReservationId.is_in(ids.clone()))
        .order_by_asc(reservation_customer_count::Column::Id)
        .all(db)
        .await
        .map_err(db_err)?
    {
        counts.entry(m.reservation_id).or_default().push(count_to_domain(m));
    }

    let mut payments: HashMap<i32, Vec<Payment>> = HashMap::new();
    for m in reservation_payment::Entity::find()
        .filter(reservation_payment::Column::ReservationId.is_in(ids))
        .order_by_asc(reservation_payment::Column::Id)
        .all(db)
        .await
        .map_err(db_err)?
    {
        payments
            .entry(m.reservation_id)
            .or_default()
            .push(payment_to_domain(m)?);
    }

    models
        .into_iter()
        .map(|m| {
            let c = counts.remove(&m.id).unwrap_or_default();
            let p = payments.remove(&m.id).unwrap_or_default();
            model_to_domain(m, c, p)
        })
        .collect()
}

async fn insert_payment<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
    payment: NewPayment,
) -> DomainResult<Payment> {
    let model = reservation_payment::ActiveModel {
        id: NotSet,
        reservation_id: Set(reservation_id),
        amount: Set(to_minor_units(payment.amount)?),
        method: Set(payment.method),
        status: Set(payment.status.as_str().to_string()),
        recorded_at: Set(payment.recorded_at),
    }
    .insert(db)
    .await
    .map_err(db_err)?;
    payment_to_domain(model)
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn create(&self, new: NewReservation) -> DomainResult<Reservation> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let stored = reservation::ActiveModel {
            id: NotSet,
            branch_id: Set(new.branch_id),
            customer_id: Set(new.customer_id),
            status: Set(new.status.as_str().to_string()),
            payment_status: Set(new.payment_status.as_str().to_string()),
            total_price: Set(to_minor_units(new.total_price)?),
            created_date: Set(new.created_date),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        let id = stored.id;

        let mut counts = Vec::with_capacity(new.counts.len());
        for c in new.counts {
            let model = reservation_customer_count::ActiveModel {
                id: NotSet,
                reservation_id: Set(id),
                customer_type_id: Set(c.customer_type_id),
                rate_row_id: Set(c.rate_row_id),
                count: Set(c.count),
                unit_price: Set(to_minor_units(c.unit_price)?),
                duration_minutes: Set(c.duration_minutes),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            counts.push(count_to_domain(model));
        }

        let mut payments = Vec::with_capacity(new.payments.len());
        for p in new.payments {
            payments.push(insert_payment(&txn, id, p).await?);
        }

        // On SQLite the reservation insert above holds the write lock, so no
        // other process can claim these numbers before commit.
        let numbers = assign_barcode_numbers(&new.barcode_prefix, id, &new.barcodes)?;
        if let Some(taken) = first_number_in_use(&txn, &numbers).await? {
            return Err(DomainError::Validation(format!(
                "barcode number {} is already in use",
                taken
            )));
        }

        let barcode_count = new.barcodes.len();
        for (b, number) in new.barcodes.into_iter().zip(numbers) {
            barcode_entry::ActiveModel {
                id: NotSet,
                reservation_id: Set(id),
                barcode_number: Set(number),
                customer_type_id: Set(b.customer_type_id),
                initial_minutes: Set(b.initial_minutes),
                status: Set(BarcodeStatus::Pending.as_str().to_string()),
                created_at: Set(b.created_at),
                completed_at: Set(None),
                version: Set(0),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        info!(
            "Stored reservation {} with {} barcode(s)",
            id, barcode_count
        );

        model_to_domain(stored, counts, payments)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let Some(model) = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(load_reservations(&self.db, vec![model]).await?.pop())
    }

    async fn find_by_customers(&self, customer_ids: &[i32]) -> DomainResult<Vec<Reservation>> {
        if customer_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = reservation::Entity::find()
            .filter(reservation::Column::CustomerId.is_in(customer_ids.to_vec()))
            .order_by_desc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        load_reservations(&self.db, models).await
    }

    async fn update_status(
        &self,
        id: i32,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool> {
        debug!("Reservation {} status {} -> {}", id, from, to);

        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(to.as_str()))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected > 0 {
            return Ok(true);
        }

        let exists = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        match exists {
            Some(_) => Ok(false),
            None => Err(DomainError::not_found("Reservation", "id", id)),
        }
    }

    async fn append_payment(
        &self,
        id: i32,
        payment: NewPayment,
        payment_status: PaymentStatus,
    ) -> DomainResult<Payment> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::PaymentStatus,
                Expr::value(payment_status.as_str()),
            )
            .filter(reservation::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Reservation", "id", id));
        }

        let stored = insert_payment(&txn, id, payment).await?;
        txn.commit().await.map_err(db_err)?;

        debug!(
            "Payment {} recorded for reservation {}, payment status {}",
            stored.id, id, payment_status
        );
        Ok(stored)
    }
}
