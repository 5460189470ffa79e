//! Liveness endpoint
//!
//! Also reports how many bridge devices each zone resolves to, so a
//! misconfigured zone shows up without issuing a voice command.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    /// Device count per zone, keyed by zone name
    pub zones: BTreeMap<String, usize>,
}

async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthReport> {
    let zones = state
        .handoff
        .router()
        .zones()
        .iter()
        .map(|(target, ids)| (target.to_string(), ids.len()))
        .collect();

    Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        zones,
    })
}

/// `GET /health`
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
