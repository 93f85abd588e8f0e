//! Shared HTTP building blocks

pub mod validated_json;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::SharedEngine;
use crate::domain::DomainError;

pub use validated_json::ValidatedJson;

/// Standard API response envelope.
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "...", "code": "not_found"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Self::error(message)
        }
    }
}

/// Domain error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::State(_)
        | DomainError::BarcodeClosed(_)
        | DomainError::AlreadyOutside(_)
        | DomainError::NotOutside(_) => StatusCode::CONFLICT,
        DomainError::Mismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.code(), "Request rejected");
        }
        let body = ApiResponse::<()>::error_with_code(self.0.to_string(), self.0.code());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// State shared by every engine-backed handler
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
}

impl AppState {
    /// Reference time and venue offset for rendering views
    pub fn view(&self) -> ViewContext {
        ViewContext {
            now: self.engine.clock().now(),
            offset: self.engine.settings().utc_offset,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

/// Amounts always render with two decimal places ("40.00").
pub fn money(amount: Decimal) -> Decimal {
    let mut rendered = amount;
    rendered.rescale(2);
    rendered
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_for(&DomainError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DomainError::not_found("Reservation", "id", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&DomainError::BarcodeClosed(1)), StatusCode::CONFLICT);
        assert_eq!(status_for(&DomainError::AlreadyOutside(1)), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&DomainError::Mismatch("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DomainError::Storage("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn money_renders_two_places() {
        assert_eq!(money(Decimal::from(40)).to_string(), "40.00");
        assert_eq!(money(Decimal::new(125, 1)).to_string(), "12.50");
    }

    #[test]
    fn error_envelope_carries_code() {
        let body = ApiResponse::<()>::error_with_code("gone", "not_found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "not_found");
        assert!(json["data"].is_null());
    }
}
