//! Session handlers

use axum::{extract::{Path, State}, Json};
use chrono::Utc;

use phantomshield_core::logic::risk::SessionView;

use crate::{AppState, AppError, AppResult};
use crate::models::EndSessionResponse;

/// Current state and decayed score of a session
pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    state.engine
        .session_view(&session_id, Utc::now())
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
}

/// Logout: drop the live session. Contained ids stay contained.
pub async fn end(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<EndSessionResponse> {
    let now = Utc::now();
    let ended = state.engine.end_session(&session_id, now).await;
    let contained = state.engine
        .session_view(&session_id, now)
        .await
        .map(|view| view.contained)
        .unwrap_or(false);

    if ended {
        tracing::info!(session = %session_id, contained, "Session ended");
    }

    Json(EndSessionResponse { session_id, ended, contained })
}
