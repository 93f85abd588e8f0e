//! Reservation HTTP handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::*;
use crate::domain::ReservationDetail;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, AppState, ValidatedJson};

fn detail_response(
    state: &AppState,
    detail: &ReservationDetail,
) -> Json<ApiResponse<ReservationDetailDto>> {
    Json(ApiResponse::success(ReservationDetailDto::from_domain(
        detail,
        state.view(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("api_key" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created with its barcodes", body = ApiResponse<ReservationDetailDto>),
        (status = 400, description = "Invalid request, inactive branch or rate row of another branch"),
        (status = 404, description = "Branch, customer or rate row not found")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationDetailDto>>), ApiError> {
    let detail = state.engine.create_reservation(request.into()).await?;
    Ok((StatusCode::CREATED, detail_response(&state, &detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation detail", body = ApiResponse<ReservationDetailDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state.engine.get_reservation(reservation_id).await?;
    Ok(detail_response(&state, &detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/confirm",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation confirmed", body = ApiResponse<ReservationDetailDto>),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Not awaiting payment, or not paid")
    )
)]
pub async fn confirm_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state.engine.confirm_reservation(reservation_id).await?;
    Ok(detail_response(&state, &detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/cancel",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<ReservationDetailDto>),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation can no longer be cancelled")
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state.engine.cancel_reservation(reservation_id).await?;
    Ok(detail_response(&state, &detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/complete",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation completed", body = ApiResponse<ReservationDetailDto>),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Some barcodes are still pending")
    )
)]
pub async fn complete_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state.engine.complete_reservation(reservation_id).await?;
    Ok(detail_response(&state, &detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/barcodes/confirm",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "All pending barcodes completed", body = ApiResponse<ReservationDetailDto>),
        (status = 404, description = "Reservation not found or has no barcodes"),
        (status = 409, description = "Reservation is cancelled")
    )
)]
pub async fn confirm_all_barcodes(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state.engine.confirm_all_barcodes(reservation_id).await?;
    Ok(detail_response(&state, &detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/payments",
    tag = "Reservations",
    security(("api_key" = [])),
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<ReservationDetailDto>),
        (status = 400, description = "Invalid amount or method"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is cancelled")
    )
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(reservation_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RecordPaymentRequest>,
) -> ApiResult<ReservationDetailDto> {
    let detail = state
        .engine
        .record_payment(reservation_id, request.into())
        .await?;
    Ok(detail_response(&state, &detail))
}
