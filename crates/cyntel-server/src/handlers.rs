//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::Instrument;

use cyntel_advisor::{Command, CommandFailure, help_text};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub narrative_provider: String,
    pub narrative_connected: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let narrative_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        narrative_provider: state.provider.name().to_string(),
        narrative_connected,
    })
}

/// Welcome / help text
pub async fn help() -> String {
    help_text()
}

/// Run one command; the plain-text body is the raw argument
pub async fn run_command(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> (StatusCode, String) {
    let Ok(command) = name.parse::<Command>() else {
        tracing::debug!(%name, "Unknown command");
        return (StatusCode::NOT_FOUND, help_text());
    };

    let request_id = uuid::Uuid::new_v4();
    let reply = state
        .pipeline
        .respond(command, &body)
        .instrument(tracing::info_span!("request", %request_id))
        .await;

    (status_for(reply.failure.as_ref()), reply.text)
}

/// HTTP status for a command outcome
pub const fn status_for(failure: Option<&CommandFailure>) -> StatusCode {
    match failure {
        None => StatusCode::OK,
        Some(CommandFailure::MissingArgument) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(CommandFailure::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(CommandFailure::DataUnavailable | CommandFailure::NarrativeUnavailable) => {
            StatusCode::BAD_GATEWAY
        }
    }
}
