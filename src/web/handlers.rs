//! HTTP handlers for the snapshot read API.

use crate::store::{NoData, SnapshotStore};
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

/// Current snapshot, or 503 when none is available.
pub async fn get_snapshot(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.load(None).await {
        Ok(snapshot) => match serde_json::to_value(&snapshot) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => {
                tracing::error!("Failed to serialize snapshot: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error" })),
                )
            }
        },
        Err(no_data) => {
            let reason = match &no_data {
                NoData::Missing => "missing",
                NoData::Unreadable(_) => "unreadable",
                NoData::Corrupt(_) => "corrupt",
                NoData::Stale { .. } => "stale",
            };
            tracing::debug!("Snapshot requested but unavailable: {}", no_data);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "no_data", "reason": reason })),
            )
        }
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "hazard-watch",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
