use axum::Json;
use serde_json::{json, Value};

/// Liveness only, no dependency checks.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = OK, description = "Service is up")
    ))]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
