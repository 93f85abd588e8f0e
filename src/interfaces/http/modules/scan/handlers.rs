//! Scan HTTP handler

use axum::extract::{Query, State};
use axum::Json;

use super::dto::*;
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/scan",
    tag = "Scan",
    security(("api_key" = [])),
    params(ScanParams),
    responses(
        (status = 200, description = "Resolved reservations (possibly none)", body = ApiResponse<ScanResponse>)
    )
)]
pub async fn resolve_scan(
    State(state): State<AppState>,
    Query(params): Query<ScanParams>,
) -> ApiResult<ScanResponse> {
    let outcome = state.engine.resolve_scan(&params.value).await?;
    tracing::debug!(
        reset = outcome.is_reset(),
        matches = outcome.matches().len(),
        "Scan resolved"
    );
    Ok(Json(ApiResponse::success(ScanResponse::from_outcome(
        &outcome,
        state.view(),
    ))))
}
