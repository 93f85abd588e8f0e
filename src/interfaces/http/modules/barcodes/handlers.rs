//! Barcode HTTP handlers

use axum::extract::{Path, State};
use axum::Json;

use super::dto::*;
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppState, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/v1/barcodes/{barcode_id}",
    tag = "Barcodes",
    security(("api_key" = [])),
    params(("barcode_id" = i32, Path, description = "Barcode entry ID")),
    responses(
        (status = 200, description = "Barcode with ledger and tracker", body = ApiResponse<BarcodeDto>),
        (status = 404, description = "Barcode not found")
    )
)]
pub async fn get_barcode(
    State(state): State<AppState>,
    Path(barcode_id): Path<i32>,
) -> ApiResult<BarcodeDto> {
    let barcode = state.engine.get_barcode(barcode_id).await?;
    Ok(Json(ApiResponse::success(BarcodeDto::from_domain(
        &barcode,
        state.view(),
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/barcodes/{barcode_id}/confirm",
    tag = "Barcodes",
    security(("api_key" = [])),
    params(("barcode_id" = i32, Path, description = "Barcode entry ID")),
    responses(
        (status = 200, description = "Barcode completed (idempotent)", body = ApiResponse<BarcodeDto>),
        (status = 404, description = "Barcode not found"),
        (status = 409, description = "Reservation is cancelled")
    )
)]
pub async fn confirm_barcode(
    State(state): State<AppState>,
    Path(barcode_id): Path<i32>,
) -> ApiResult<BarcodeDto> {
    let barcode = state.engine.confirm_barcode(barcode_id).await?;
    Ok(Json(ApiResponse::success(BarcodeDto::from_domain(
        &barcode,
        state.view(),
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/barcodes/{barcode_id}/extra-time",
    tag = "Barcodes",
    security(("api_key" = [])),
    params(("barcode_id" = i32, Path, description = "Barcode entry ID")),
    request_body = AddExtraTimeRequest,
    responses(
        (status = 200, description = "Extra time added", body = ApiResponse<ExtraTimeReceiptDto>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Barcode or rate row not found"),
        (status = 409, description = "Barcode already completed"),
        (status = 422, description = "Rate row does not fit the barcode")
    )
)]
pub async fn add_extra_time(
    State(state): State<AppState>,
    Path(barcode_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<AddExtraTimeRequest>,
) -> ApiResult<ExtraTimeReceiptDto> {
    let receipt = state
        .engine
        .add_extra_time(barcode_id, request.rate_row_id, request.quantity)
        .await?;
    Ok(Json(ApiResponse::success(ExtraTimeReceiptDto::from(&receipt))))
}

#[utoipa::path(
    post,
    path = "/api/v1/barcodes/{barcode_id}/outside",
    tag = "Barcodes",
    security(("api_key" = [])),
    params(("barcode_id" = i32, Path, description = "Barcode entry ID")),
    responses(
        (status = 200, description = "Outside entry opened", body = ApiResponse<OutsideTrackDto>),
        (status = 404, description = "Barcode not found"),
        (status = 409, description = "Already outside, completed or unpaid")
    )
)]
pub async fn mark_outside(
    State(state): State<AppState>,
    Path(barcode_id): Path<i32>,
) -> ApiResult<OutsideTrackDto> {
    let track = state.engine.mark_outside(barcode_id).await?;
    Ok(Json(ApiResponse::success(OutsideTrackDto::from_domain(
        &track,
        state.view(),
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/barcodes/{barcode_id}/inside",
    tag = "Barcodes",
    security(("api_key" = [])),
    params(("barcode_id" = i32, Path, description = "Barcode entry ID")),
    responses(
        (status = 200, description = "Outside entry closed", body = ApiResponse<OutsideTrackDto>),
        (status = 404, description = "Barcode not found"),
        (status = 409, description = "Not outside or completed")
    )
)]
pub async fn mark_inside(
    State(state): State<AppState>,
    Path(barcode_id): Path<i32>,
) -> ApiResult<OutsideTrackDto> {
    let track = state.engine.mark_inside(barcode_id).await?;
    Ok(Json(ApiResponse::success(OutsideTrackDto::from_domain(
        &track,
        state.view(),
    ))))
}
