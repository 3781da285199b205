use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::PersonalizationEngine,
};

pub mod compatibility;
pub mod events;
pub mod fingerprints;
pub mod recommendations;

/// Shared state handed to every handler
pub struct AppState {
    pub engine: Arc<PersonalizationEngine>,
}

impl AppState {
    pub fn new(engine: Arc<PersonalizationEngine>) -> Self {
        Self { engine }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/:user_id/events", post(events::record_event))
        .route("/users/:user_id/fingerprint", get(fingerprints::get_fingerprint))
        .route(
            "/users/:user_id/fingerprint/preferences",
            put(fingerprints::update_preferences),
        )
        .route(
            "/users/:user_id/fingerprint/reset",
            post(fingerprints::reset_fingerprint),
        )
        .route("/users/:user_id/genres", put(fingerprints::set_genres))
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::get_recommendations),
        )
        .route(
            "/users/:user_id/daily-picks",
            get(recommendations::get_daily_picks),
        )
        .route(
            "/users/:user_id/compatibility/:item_id",
            get(compatibility::score_compatibility),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
