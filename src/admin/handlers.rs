use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::config::validation::clamp_chaos_config;
use crate::config::ChaosConfig;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub chaos_enabled: bool,
    pub requests_seen: u64,
}

#[derive(Debug, Serialize)]
pub struct ActiveChaos {
    pub enabled: bool,
    pub active_types: Vec<&'static str>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        chaos_enabled: state.engine.config().enabled,
        requests_seen: state.engine.decider().state().request_count(),
    })
}

pub async fn get_chaos(State(state): State<AdminState>) -> Json<ChaosConfig> {
    Json(state.engine.config().as_ref().clone())
}

/// Replace the chaos configuration. Out-of-range values are clamped, not rejected.
pub async fn put_chaos(
    State(state): State<AdminState>,
    Json(submitted): Json<ChaosConfig>,
) -> Json<ChaosConfig> {
    let config = clamp_chaos_config(submitted);
    state.engine.update_config(config.clone()).await;
    Json(config)
}

pub async fn get_active(State(state): State<AdminState>) -> Json<ActiveChaos> {
    Json(ActiveChaos {
        enabled: state.engine.config().enabled,
        active_types: state.engine.active_chaos_types(),
    })
}
