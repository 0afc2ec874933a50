//! Forensic audit handlers (admin)

use axum::{extract::{Path, Query, State}, Json};
use validator::Validate;

use phantomshield_core::SessionTimeline;

use crate::{AppState, AppError, AppResult};
use crate::models::{ForensicsFilter, ForensicsResponse};

/// Query records by session and time range, oldest first
pub async fn query(
    State(state): State<AppState>,
    Query(filter): Query<ForensicsFilter>,
) -> AppResult<Json<ForensicsResponse>> {
    filter.validate()?;

    let records = state.engine.query(filter.into_query()).await?;

    Ok(Json(ForensicsResponse {
        count: records.len(),
        records,
    }))
}

/// Summarised investigation view of one session
pub async fn timeline(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionTimeline>> {
    let timeline = state.engine.timeline(&session_id).await?;

    if timeline.is_empty() {
        return Err(AppError::NotFound(format!("No forensic records for session {}", session_id)));
    }

    Ok(Json(timeline))
}
