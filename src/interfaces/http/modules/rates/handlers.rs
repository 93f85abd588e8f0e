//! Rate catalogue HTTP handler

use axum::extract::{Query, State};
use axum::Json;

use super::dto::*;
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/rates",
    tag = "Rates",
    security(("api_key" = [])),
    params(RateQuery),
    responses(
        (status = 200, description = "Durations offered for the branch and customer type, shortest first", body = ApiResponse<Vec<RateRowDto>>)
    )
)]
pub async fn list_rates(
    State(state): State<AppState>,
    Query(query): Query<RateQuery>,
) -> ApiResult<Vec<RateRowDto>> {
    let rows = state
        .engine
        .rate_catalogue(query.branch_id, query.customer_type_id)
        .await?;
    Ok(Json(ApiResponse::success(
        rows.iter().map(RateRowDto::from).collect(),
    )))
}
