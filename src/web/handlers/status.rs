// Status handler — DB stats for dashboards and smoke checks.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{api_error, AppState};

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Response {
    match state.db.stats().await {
        Ok((projects, conversations, keyword_sets)) => Json(serde_json::json!({
            "projects": projects,
            "conversations": conversations,
            "keyword_sets": keyword_sets,
            "threshold": state.config.threshold,
            "agent_speaker": state.config.agent_speaker,
            "customer_speaker": state.config.customer_speaker,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stats");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load stats")
        }
    }
}
