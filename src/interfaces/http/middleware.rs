//! API key middleware for Axum
//!
//! Staff clients send `X-API-Key: <key>` or `Authorization: ApiKey <key>`.
//! Only SHA-256 hex digests of accepted keys are configured. An empty
//! digest list disables the check.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use super::common::ApiError;
use crate::domain::DomainError;

const API_KEY_HEADER: &str = "x-api-key";
const AUTH_SCHEME: &str = "ApiKey ";

/// Accepted API key digests
#[derive(Clone, Default)]
pub struct ApiKeyState {
    hashes: Arc<HashSet<String>>,
}

impl ApiKeyState {
    pub fn new<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: Arc::new(
                hashes
                    .into_iter()
                    .map(|h| h.as_ref().trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect(),
            ),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.hashes.is_empty()
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.hashes.contains(&hash_api_key(key))
    }
}

/// Hex SHA-256 of an API key
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(key.trim());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(AUTH_SCHEME))
        .map(str::trim)
}

pub async fn api_key_middleware(
    State(state): State<ApiKeyState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.is_enabled() {
        return next.run(request).await;
    }

    let verdict = extract_api_key(request.headers()).map(|key| state.accepts(key));
    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with unknown API key");
            ApiError(DomainError::Unauthorized("Invalid API key".into())).into_response()
        }
        None => ApiError(DomainError::Unauthorized("Missing API key".into())).into_response(),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(state: ApiKeyState) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(state, api_key_middleware))
    }

    async fn call(state: ApiKeyState, header: Option<(&str, &str)>) -> StatusCode {
        let mut builder = Request::builder().uri("/ping");
        if let Some((name, value)) = header {
            builder = builder.header(name, HeaderValue::from_str(value).unwrap());
        }
        app(state)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn digest_is_lowercase_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn empty_list_disables_the_check() {
        assert_eq!(call(ApiKeyState::default(), None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn accepts_both_header_forms() {
        let state = ApiKeyState::new([hash_api_key("front-desk")]);
        assert_eq!(
            call(state.clone(), Some(("X-API-Key", "front-desk"))).await,
            StatusCode::OK
        );
        assert_eq!(
            call(state, Some(("Authorization", "ApiKey front-desk"))).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn rejects_missing_or_unknown_keys() {
        let state = ApiKeyState::new([hash_api_key("front-desk")]);
        assert_eq!(call(state.clone(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(state.clone(), Some(("X-API-Key", "guess"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(state, Some(("Authorization", "Bearer front-desk"))).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
