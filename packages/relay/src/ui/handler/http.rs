//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use huddle_shared::protocol::HistoryResponse;
use serde::Serialize;

use crate::{infrastructure::conversion::history_response, ui::state::AppState};

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of open WebSocket connections
    pub connections: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.message_pusher.count_clients().await,
    })
}

/// Stored messages of a workspace, oldest first
pub async fn get_workspace_messages(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, StatusCode> {
    let user = state.tokens.authenticate(&headers).map_err(|e| {
        tracing::warn!("History request for '{}' rejected: {}", workspace_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    match state.get_history_usecase.execute(&workspace_id).await {
        Ok(messages) => {
            tracing::debug!(
                "Served {} message(s) of '{}' to '{}'",
                messages.len(),
                workspace_id,
                user.user_id
            );
            Ok(Json(history_response(messages)))
        }
        Err(e) => {
            tracing::error!("Failed to read history of '{}': {}", workspace_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
