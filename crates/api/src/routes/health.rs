use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check with running pipeline counters. No auth required.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let stats = state.stats.read().await.clone();
    Json(json!({
        "status": "ok",
        "market": state.market,
        "winRate": stats.win_rate(),
        "stats": stats,
    }))
}
