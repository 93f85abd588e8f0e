//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub branch_id: i32,
    pub customer_id: i32,

    /// PENDING_PAYMENT, CONFIRMED, WENT_OUTSIDE, BACK_INSIDE, COMPLETED, CANCELLED
    pub status: String,

    /// PENDING, PAID, FAILED
    pub payment_status: String,

    /// Minor units, fixed at creation
    pub total_price: i64,

    pub created_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::barcode_entry::Entity")]
    BarcodeEntries,
    #[sea_orm(has_many = "super::reservation_customer_count::Entity")]
    CustomerCounts,
    #[sea_orm(has_many = "super::reservation_payment::Entity")]
    Payments,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::barcode_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BarcodeEntries.def()
    }
}

impl Related<super::reservation_customer_count::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerCounts.def()
    }
}

impl Related<super::reservation_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
