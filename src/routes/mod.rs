pub mod activity;
pub mod auth;
pub mod exercises;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.storage.max_body_bytes();

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(exercises::router())
        .merge(activity::router())
        .merge(uploads::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
