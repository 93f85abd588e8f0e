//! Branch entity (read-only reference)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "branches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rate_row::Entity")]
    RateRows,
}

impl Related<super::rate_row::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RateRows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
