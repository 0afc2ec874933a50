//! Admin handlers

use axum::{extract::State, Json};
use serde::Serialize;

use phantomshield_core::EngineStats;

use crate::{AppState, AppResult};

#[derive(Serialize)]
pub struct ReloadResponse {
    generation: u64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    version: &'static str,
    environment: String,
    sink: String,
    stats: EngineStats,
}

/// Re-read the engine config file. A rejected file leaves the active config in place.
pub async fn reload_config(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let generation = state.engine.reload_config()?;
    tracing::info!(generation, "Engine config reloaded");
    Ok(Json(ReloadResponse { generation }))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        sink: state.engine.forensics().sink_name().to_string(),
        stats: state.engine.stats(),
    })
}
