use super::server::ServerState;
use crate::app::LifecycleState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

pub const LIVENESS_MESSAGE: &str = "Bot host is running!";

/// Point-in-time view of dependency connectivity, built per request
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    #[serde(rename = "whatsappConnected")]
    pub messaging_connected: bool,
    #[serde(rename = "databaseConnected")]
    pub storage_connected: bool,
    pub version: String,
    pub lifecycle: LifecycleState,
    pub timestamp: DateTime<Utc>,
}

impl HealthSnapshot {
    pub fn capture(state: &ServerState) -> Self {
        Self {
            status: "ok",
            messaging_connected: state.messaging.is_connected(),
            storage_connected: state.storage.is_connected(),
            version: state.version.clone(),
            lifecycle: *state.lifecycle.borrow(),
            timestamp: Utc::now(),
        }
    }
}

/// Handler for the liveness endpoint
pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_MESSAGE)
}

/// Handler for health check endpoint
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let snapshot = HealthSnapshot::capture(&state);
    debug!(
        "Health snapshot: storage={} messaging={} lifecycle={}",
        snapshot.storage_connected, snapshot.messaging_connected, snapshot.lifecycle
    );

    (StatusCode::OK, Json(snapshot))
}
