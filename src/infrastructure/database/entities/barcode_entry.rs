//! Barcode entry entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "barcode_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub reservation_id: i32,
    pub barcode_number: String,
    pub customer_type_id: i32,
    pub initial_minutes: i32,

    /// PENDING or COMPLETED
    pub status: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeUtc>,

    /// Bumped by every guarded write
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reservation::Entity",
        from = "Column::ReservationId",
        to = "super::reservation::Column::Id"
    )]
    Reservation,
    #[sea_orm(has_many = "super::extra_time_charge::Entity")]
    ExtraTimeCharges,
    #[sea_orm(has_many = "super::outside_track_entry::Entity")]
    OutsideTrackEntries,
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservation.def()
    }
}

impl Related<super::extra_time_charge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExtraTimeCharges.def()
    }
}

impl Related<super::outside_track_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutsideTrackEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
