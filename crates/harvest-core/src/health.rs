use axum::Json;
use serde_json::{Value, json};

/// Handler for `GET /healthz` (liveness).
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler for `GET /readyz` (readiness). Services that need deeper checks
/// (database reachability etc.) mount their own handler instead.
pub async fn readyz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
