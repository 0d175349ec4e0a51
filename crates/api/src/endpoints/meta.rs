//! Service liveness endpoints.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::response;

/// `GET /` and `GET /health`, usable under any router state.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Pet Adoption API running" }))
}

async fn health() -> Json<Value> {
    response::ok()
}
