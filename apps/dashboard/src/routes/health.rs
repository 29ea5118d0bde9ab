use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness of the dashboard itself plus the last backend snapshot, if any.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let backend = state.health.latest().await.map(|snapshot| {
        json!({
            "status": snapshot.status.as_str(),
            "reachable": snapshot.reachable,
            "checked_at": snapshot.checked_at,
        })
    });

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-screening-dashboard",
        "backend": backend,
    }))
}
