//! Outside-tracker entry

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outside_track_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub barcode_id: i32,
    pub out_at: DateTimeUtc,
    /// NULL while the guest is outside
    #[sea_orm(nullable)]
    pub in_at: Option<DateTimeUtc>,
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
