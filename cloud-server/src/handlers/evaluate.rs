//! Inbound routing handler

use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use phantomshield_core::Decision;

use crate::{AppState, AppResult};
use crate::models::EvaluateRequest;

/// Score one request and return the routing verdict
pub async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> AppResult<Json<Decision>> {
    req.validate()?;

    let request = req.into_route_request(Utc::now());
    let decision = state.engine.evaluate(request).await;

    tracing::debug!(
        session = %decision.session_id,
        verdict = decision.verdict.as_str(),
        score = decision.score,
        "Evaluated"
    );

    Ok(Json(decision))
}
