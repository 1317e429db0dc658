//! HTTP routing

pub mod dto;
mod handlers;

use crate::services::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Every route is served both at the root and under `/api`.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/submissions",
            get(handlers::list_submissions).post(handlers::create_submission),
        )
        .route("/engagements", post(handlers::toggle_engagement))
        .route("/leaderboard", get(handlers::leaderboard))
        .route("/moderate", post(handlers::moderate))
        .route("/apply-filter", post(handlers::apply_filter));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
