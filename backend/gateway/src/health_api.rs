//! Gateway Health API

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    /// Research providers in fallback order.
    pub providers: Vec<String>,
    pub chat_available: bool,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let providers = state.orchestrator.provider_names();
    let status = if providers.is_empty() { "degraded" } else { "ok" };

    Json(HealthReport {
        status: status.into(),
        service: "sportsgpt".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        active_sessions: state.store.len(),
        providers,
        chat_available: state.chat.is_some(),
        timestamp: Utc::now(),
    })
}
