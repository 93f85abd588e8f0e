//! Rate DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::RateRow;
use crate::interfaces::http::common::money;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RateQuery {
    pub branch_id: i32,
    pub customer_type_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateRowDto {
    pub id: i32,
    pub branch_id: i32,
    pub customer_type_id: i32,
    pub duration_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
}

impl From<&RateRow> for RateRowDto {
    fn from(r: &RateRow) -> Self {
        Self {
            id: r.id,
            branch_id: r.branch_id,
            customer_type_id: r.customer_type_id,
            duration_minutes: r.duration_minutes,
            price: money(r.price),
        }
    }
}
