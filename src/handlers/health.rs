//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns the
//! hit-ratio health indicator, engine state, last poll error and poll
//! statistics.

use arcstats_monitor::{EngineState, HealthStatus, LastError};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use super::{FOOTER_TEXT, TEXT_PLAIN};
use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let collector = &state.collector;
    let health = collector.view().health_status();

    // Derive HTTP status from snapshot availability
    let status = match health {
        HealthStatus::Unknown => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Warning => StatusCode::OK,
    };

    let message = match health {
        HealthStatus::Ok => "OK",
        HealthStatus::Warning => "WARNING - hit ratio below threshold",
        HealthStatus::Unknown => "UNKNOWN - no snapshot captured yet",
    };

    let table = collector.poll_stats().render_table();
    let engine = render_engine_section(
        collector.state(),
        &collector.source_description(),
        collector.history_len(),
        collector.history_capacity(),
        collector.last_error().as_ref(),
    );

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [TEXT_PLAIN],
        format!("{message}\n\n{table}\n{engine}\n{FOOTER_TEXT}\n"),
    )
}

/// Renders engine state and the last poll error as plain text.
fn render_engine_section(
    state: EngineState,
    source: &str,
    history_len: usize,
    history_capacity: usize,
    last_error: Option<&LastError>,
) -> String {
    let mut out = String::new();
    writeln!(out, "ENGINE").ok();
    writeln!(out, "======").ok();
    writeln!(out).ok();
    let state = match state {
        EngineState::Idle => "idle",
        EngineState::Running => "running",
    };
    writeln!(out, "{:16} {}", "state:", state).ok();
    writeln!(out, "{:16} {}", "source:", source).ok();
    writeln!(out, "{:16} {}/{}", "history:", history_len, history_capacity).ok();
    match last_error {
        Some(e) => writeln!(
            out,
            "{:16} [{}] {} at {}",
            "last error:",
            e.kind,
            e.message,
            e.at.to_rfc3339()
        )
        .ok(),
        None => writeln!(out, "{:16} none", "last error:").ok(),
    };
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_text, state_with_file, DUMP};

    #[tokio::test]
    async fn test_health_unknown_before_first_poll() {
        let (state, _file) = state_with_file(DUMP);
        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(response).await.starts_with("UNKNOWN"));
    }

    #[tokio::test]
    async fn test_health_ok_after_poll() {
        let (state, _file) = state_with_file(DUMP);
        state.collector.poll().await;
        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.starts_with("OK"));
        assert!(body.contains("last error:      none"));
        assert!(body.contains("history:         1/60"));
    }

    #[tokio::test]
    async fn test_health_reports_last_error() {
        let (state, _file) = state_with_file("not a metric line at all\n");
        state.collector.poll().await;
        let body = body_text(health_handler(State(state)).await.into_response()).await;
        assert!(body.contains("[parse] no valid metrics found in stats output"));
    }
}
