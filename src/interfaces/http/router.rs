//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, AppState};
use super::middleware::{api_key_middleware, ApiKeyState};
use super::modules::{barcodes, health, metrics, rates, reservations, scan};
use crate::application::SharedEngine;

/// Everything the router needs from the running service
#[derive(Clone)]
pub struct ApiContext {
    pub engine: SharedEngine,
    /// Pinged by `/health`; `None` on the in-memory store
    pub db: Option<DatabaseConnection>,
    pub api_keys: ApiKeyState,
    /// Mounts `/metrics` when a Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        reservations::create_reservation,
        reservations::get_reservation,
        reservations::confirm_reservation,
        reservations::cancel_reservation,
        reservations::complete_reservation,
        reservations::confirm_all_barcodes,
        reservations::record_payment,
        barcodes::get_barcode,
        barcodes::confirm_barcode,
        barcodes::add_extra_time,
        barcodes::mark_outside,
        barcodes::mark_inside,
        scan::resolve_scan,
        rates::list_rates,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            reservations::CreateReservationRequest,
            reservations::CustomerTypeLineRequest,
            reservations::InitialPaymentRequest,
            reservations::RecordPaymentRequest,
            reservations::PaymentOutcome,
            reservations::ReservationDetailDto,
            reservations::ReservationDto,
            reservations::CustomerTypeCountDto,
            reservations::PaymentDto,
            reservations::CustomerDto,
            barcodes::BarcodeDto,
            barcodes::ExtraTimeChargeDto,
            barcodes::OutsideTrackDto,
            barcodes::AddExtraTimeRequest,
            barcodes::ExtraTimeReceiptDto,
            scan::ScanResponse,
            rates::RateRowDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Reservations", description = "Bookings, payments and reservation lifecycle"),
        (name = "Barcodes", description = "Per-guest entries: confirmation, extra time, outside tracking"),
        (name = "Scan", description = "Resolve a scanned barcode or mobile number"),
        (name = "Rates", description = "Duration and price catalogue"),
    ),
    info(
        title = "Admission Session & Billing API",
        version = "1.0.0",
        description = "Reservations, barcode entries, extra time and outside tracking for a pay-to-play venue"
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let app_state = AppState {
        engine: ctx.engine.clone(),
    };

    let api_routes = Router::new()
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations/{reservation_id}", get(reservations::get_reservation))
        .route(
            "/reservations/{reservation_id}/confirm",
            post(reservations::confirm_reservation),
        )
        .route(
            "/reservations/{reservation_id}/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/reservations/{reservation_id}/complete",
            post(reservations::complete_reservation),
        )
        .route(
            "/reservations/{reservation_id}/barcodes/confirm",
            post(reservations::confirm_all_barcodes),
        )
        .route(
            "/reservations/{reservation_id}/payments",
            post(reservations::record_payment),
        )
        .route("/barcodes/{barcode_id}", get(barcodes::get_barcode))
        .route("/barcodes/{barcode_id}/confirm", post(barcodes::confirm_barcode))
        .route("/barcodes/{barcode_id}/extra-time", post(barcodes::add_extra_time))
        .route("/barcodes/{barcode_id}/outside", post(barcodes::mark_outside))
        .route("/barcodes/{barcode_id}/inside", post(barcodes::mark_inside))
        .route("/scan", get(scan::resolve_scan))
        .route("/rates", get(rates::list_rates))
        .route_layer(middleware::from_fn_with_state(
            ctx.api_keys.clone(),
            api_key_middleware,
        ))
        .with_state(app_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db: ctx.db.clone(),
            started_at: Arc::new(Instant::now()),
        });

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1", api_routes);

    if let Some(handle) = ctx.metrics {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::*;
    use crate::interfaces::http::middleware::hash_api_key;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with_keys(api_keys: ApiKeyState) -> (Router, crate::shared::FixedClock) {
        let (engine, clock) = engine_at(t(13, 0));
        let router = create_api_router(ApiContext {
            engine: Arc::new(engine),
            db: None,
            api_keys,
            metrics: None,
        });
        (router, clock)
    }

    fn app() -> (Router, crate::shared::FixedClock) {
        app_with_keys(ApiKeyState::default())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn booking(paid: bool) -> Value {
        let mut body = json!({
            "branch_id": BRANCH,
            "customer_id": CUSTOMER,
            "lines": [
                { "customer_type_id": ADULT, "count": 2, "rate_row_id": ADULT_60 }
            ]
        });
        if paid {
            body["payment"] = json!({ "amount": "40.00", "method": "card" });
        }
        body
    }

    #[tokio::test]
    async fn health_reports_in_memory_store() {
        let (app, _clock) = app();
        let (status, json) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"]["status"], "in_memory");
    }

    #[tokio::test]
    async fn booking_to_completion_over_http() {
        let (app, clock) = app();

        let (status, created) = send(&app, "POST", "/api/v1/reservations", Some(booking(true))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["reservation"]["status"], "CONFIRMED");
        assert_eq!(created["data"]["reservation"]["payment_status"], "PAID");
        assert_eq!(created["data"]["reservation"]["total_price"], "40.00");
        let rid = created["data"]["reservation"]["id"].as_i64().unwrap();
        let barcode = created["data"]["barcodes"][0]["id"].as_i64().unwrap();

        clock.set(t(13, 50));
        let (status, receipt) = send(
            &app,
            "POST",
            &format!("/api/v1/barcodes/{}/extra-time", barcode),
            Some(json!({ "rate_row_id": ADULT_30, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["data"]["computed_total"], "5.00");
        assert_eq!(receipt["data"]["end_time"], "2024-05-01T14:30:00Z");

        clock.set(t(14, 0));
        let outside = format!("/api/v1/barcodes/{}/outside", barcode);
        let (status, track) = send(&app, "POST", &outside, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(track["data"]["out_time"], "14:00");

        let (status, err) = send(&app, "POST", &outside, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "already_outside");

        let (_, detail) = send(&app, "GET", &format!("/api/v1/reservations/{}", rid), None).await;
        assert_eq!(detail["data"]["reservation"]["status"], "WENT_OUTSIDE");

        clock.set(t(14, 45));
        let (status, back) = send(
            &app,
            "POST",
            &format!("/api/v1/barcodes/{}/inside", barcode),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(back["data"]["in_time"], "14:45");

        let (status, done) = send(
            &app,
            "POST",
            &format!("/api/v1/reservations/{}/barcodes/confirm", rid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["data"]["reservation"]["status"], "COMPLETED");

        let (status, err) = send(
            &app,
            "POST",
            &format!("/api/v1/barcodes/{}/extra-time", barcode),
            Some(json!({ "rate_row_id": ADULT_30 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "barcode_closed");
    }

    #[tokio::test]
    async fn unpaid_booking_waits_for_payment() {
        let (app, _clock) = app();
        let (_, created) = send(&app, "POST", "/api/v1/reservations", Some(booking(false))).await;
        assert_eq!(created["data"]["reservation"]["status"], "PENDING_PAYMENT");
        let rid = created["data"]["reservation"]["id"].as_i64().unwrap();

        let (status, err) = send(
            &app,
            "POST",
            &format!("/api/v1/reservations/{}/confirm", rid),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "state_error");

        let (status, paid) = send(
            &app,
            "POST",
            &format!("/api/v1/reservations/{}/payments", rid),
            Some(json!({ "amount": "40", "method": "cash", "status": "SETTLED" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["data"]["reservation"]["payment_status"], "PAID");
        assert_eq!(paid["data"]["reservation"]["balance_due"], "0.00");
    }

    #[tokio::test]
    async fn errors_use_the_envelope() {
        let (app, _clock) = app();

        let (status, err) = send(&app, "GET", "/api/v1/reservations/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["success"], false);
        assert_eq!(err["code"], "not_found");

        let mut empty = booking(true);
        empty["lines"] = json!([]);
        let (status, err) = send(&app, "POST", "/api/v1/reservations", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "validation_error");
    }

    #[tokio::test]
    async fn zero_count_row_is_accepted_over_http() {
        let (app, _clock) = app();
        let mut body = booking(false);
        body["lines"] = json!([
            { "customer_type_id": ADULT, "count": 2, "rate_row_id": ADULT_60 },
            { "customer_type_id": KID, "count": 0, "rate_row_id": KID_60 }
        ]);
        let (status, created) = send(&app, "POST", "/api/v1/reservations", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["barcodes"].as_array().unwrap().len(), 2);
        assert_eq!(created["data"]["reservation"]["total_price"], "40.00");
    }

    #[tokio::test]
    async fn rate_of_other_customer_type_is_unprocessable() {
        let (app, _clock) = app();
        let mut body = booking(false);
        body["lines"] = json!([
            { "customer_type_id": KID, "count": 1, "rate_row_id": KID_60 }
        ]);
        let (_, created) = send(&app, "POST", "/api/v1/reservations", Some(body)).await;
        let kid_barcode = created["data"]["barcodes"][0]["id"].as_i64().unwrap();

        let (status, err) = send(
            &app,
            "POST",
            &format!("/api/v1/barcodes/{}/extra-time", kid_barcode),
            Some(json!({ "rate_row_id": ADULT_30, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["code"], "mismatch_error");
    }

    #[tokio::test]
    async fn scan_by_barcode_and_blank_reset() {
        let (app, _clock) = app();
        let (_, created) = send(&app, "POST", "/api/v1/reservations", Some(booking(true))).await;
        let number = created["data"]["barcodes"][1]["barcode_number"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, found) = send(&app, "GET", &format!("/api/v1/scan?value={}", number), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["data"]["reset"], false);
        assert_eq!(found["data"]["matches"].as_array().unwrap().len(), 1);

        let (_, reset) = send(&app, "GET", "/api/v1/scan?value=", None).await;
        assert_eq!(reset["data"]["reset"], true);
        assert!(reset["data"]["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_catalogue_is_shortest_first() {
        let (app, _clock) = app();
        let (status, rates) = send(
            &app,
            "GET",
            &format!("/api/v1/rates?branch_id={}&customer_type_id={}", BRANCH, ADULT),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let minutes: Vec<i64> = rates["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["duration_minutes"].as_i64().unwrap())
            .collect();
        assert_eq!(minutes, vec![30, 60]);
    }

    #[tokio::test]
    async fn api_key_guards_api_routes_only() {
        let (app, _clock) = app_with_keys(ApiKeyState::new([hash_api_key("desk-1")]));

        let (status, err) = send(&app, "GET", "/api/v1/reservations/1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "unauthorized");

        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/api/v1/reservations/1")
            .header("X-API-Key", "desk-1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
