//! Extra-time ledger entry

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extra_time_charges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub barcode_id: i32,
    pub rate_row_id: i32,
    pub additional_minutes: i32,
    pub billed_minutes: i32,
    /// Minor units
    pub unit_price: i64,
    pub quantity: i32,
    /// Minor units
    pub computed_total: i64,
    pub applied_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::barcode_entry::Entity",
        from = "Column::BarcodeId",
        to = "super::barcode_entry::Column::Id"
    )]
    BarcodeEntry,
}

impl Related<super::barcode_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BarcodeEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
