use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "teamform",
        "version": env!("CARGO_PKG_VERSION"),
        "tasks": state.orchestrator.store().len(),
        "workers": state.orchestrator.worker_count().await,
    }))
}
