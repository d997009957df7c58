//! Liveness, readiness, and status endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};

use crate::state::AppState;

/// Build the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/health", get(health))
}

/// Returns "ok" if the server is running. Does not check dependencies.
async fn live() -> &'static str {
    "ok"
}

/// Returns 503 Service Unavailable if the database is not reachable.
async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "auth" }))
}
