//! SeaORM implementations of the read-only lookups (rates, branches, customers)

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::db_err;
use crate::domain::directory::{Branch, BranchDirectory, Customer, CustomerDirectory};
use crate::domain::money::from_minor_units;
use crate::domain::rate::{RateRow, RateTable};
use crate::domain::scan::mobile_matches;
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{branch, customer, rate_row};

fn rate_to_domain(m: rate_row::Model) -> RateRow {
    RateRow {
        id: m.id,
        branch_id: m.branch_id,
        customer_type_id: m.customer_type_id,
        duration_minutes: m.duration_minutes,
        price: from_minor_units(m.price),
    }
}

fn customer_to_domain(m: customer::Model) -> Customer {
    Customer {
        id: m.id,
        name: m.name,
        mobile: m.mobile,
    }
}

// ── Rates ───────────────────────────────────────────────────────

pub struct SeaOrmRateTable {
    db: DatabaseConnection,
}

impl SeaOrmRateTable {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RateTable for SeaOrmRateTable {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<RateRow>> {
        let model = rate_row::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(rate_to_domain))
    }

    async fn list(&self, branch_id: i32, customer_type_id: i32) -> DomainResult<Vec<RateRow>> {
        let models = rate_row::Entity::find()
            .filter(rate_row::Column::BranchId.eq(branch_id))
            .filter(rate_row::Column::CustomerTypeId.eq(customer_type_id))
            .order_by_asc(rate_row::Column::DurationMinutes)
            .order_by_asc(rate_row::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(rate_to_domain).collect())
    }
}

// ── Branches ────────────────────────────────────────────────────

pub struct SeaOrmBranchDirectory {
    db: DatabaseConnection,
}

impl SeaOrmBranchDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BranchDirectory for SeaOrmBranchDirectory {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>> {
        let model = branch::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(|m| Branch {
            id: m.id,
            name: m.name,
            is_active: m.is_active,
        }))
    }
}

// ── Customers ───────────────────────────────────────────────────

pub struct SeaOrmCustomerDirectory {
    db: DatabaseConnection,
}

impl SeaOrmCustomerDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomerDirectory for SeaOrmCustomerDirectory {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        let model = customer::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(customer_to_domain))
    }

    async fn find_by_mobile(&self, mobile_digits: &str) -> DomainResult<Vec<Customer>> {
        // Stored numbers carry free-form formatting, so matching happens on digits here.
        let models = customer::Entity::find()
            .filter(customer::Column::Mobile.is_not_null())
            .order_by_asc(customer::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models
            .into_iter()
            .filter(|m| {
                m.mobile
                    .as_deref()
                    .map(|mobile| mobile_matches(mobile, mobile_digits))
                    .unwrap_or(false)
            })
            .map(customer_to_domain)
            .collect())
    }
}
