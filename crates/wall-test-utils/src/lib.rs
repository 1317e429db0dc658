//! Testing utilities for the wall workspace
//!
//! Shared fixtures: in-memory stores, wired routers and a JSON request helper.

#![allow(missing_docs)]

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wall_core::{moderation::classify, NewSubmission, Submission};
use wall_imagen::{ImageFilterGateway, ImagenConfig, StaticTokenSource, SystemClock, TokenCache};
use wall_server::config::DEFAULT_BODY_LIMIT;
use wall_server::{http::router, AppState};
use wall_store::{SqliteStore, WallStore};

pub async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().await.unwrap())
}

/// Gateway with a fixed token; `config` decides project and provider URL
pub fn gateway_with(config: ImagenConfig) -> Arc<ImageFilterGateway> {
    let tokens = Arc::new(TokenCache::new(Arc::new(StaticTokenSource::new("test-token"))));
    Arc::new(ImageFilterGateway::new(config, tokens, Arc::new(SystemClock)).unwrap())
}

/// Gateway with no project configured
pub fn unconfigured_gateway() -> Arc<ImageFilterGateway> {
    gateway_with(ImagenConfig::new())
}

pub fn setup_router(store: Arc<SqliteStore>, gateway: Arc<ImageFilterGateway>) -> Router {
    router(AppState::new(store, gateway), DEFAULT_BODY_LIMIT)
}

/// Router over a fresh in-memory store, plus the store for direct checks
pub async fn setup_test_app() -> (Router, Arc<SqliteStore>) {
    let store = memory_store().await;
    (setup_router(store.clone(), unconfigured_gateway()), store)
}

pub async fn create_approved(store: &SqliteStore, username: &str, message: &str) -> Submission {
    let draft = NewSubmission::new(username, Some(message), None, None).unwrap();
    let row = store.create_submission(&draft).await.unwrap();
    store.apply_verdict(row.id, &classify(message)).await.unwrap();
    store.get_submission(row.id).await.unwrap().unwrap()
}

/// Send one request; `body` is sent as JSON when present
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();
    send_request(router, request).await
}

pub async fn send_raw(router: &Router, uri: &str, raw: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();
    send_request(router, request).await
}

async fn send_request(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}
