use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers;
use crate::shared::middleware::request_logger;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// Base of the consumer-facing app, used to build trace URLs
    pub frontend_base_url: String,
}

/// All application routes
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        // Batches
        .route("/batch", post(handlers::a001_batch::create))
        .route("/batches", get(handlers::a001_batch::list_all))
        .route("/batch/:id", get(handlers::a001_batch::get_by_id))
        // Events
        .route(
            "/batch/:id/events",
            get(handlers::a002_batch_event::list_for_batch),
        )
        .route("/event", post(handlers::a002_batch_event::create))
        .layer(middleware::from_fn(request_logger))
        .with_state(state)
}

/// Only the frontend origin may call the API from a browser.
pub fn cors_layer(frontend_base_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_base_url.trim_end_matches('/'))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to PureTrace API" }))
}
