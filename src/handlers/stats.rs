//! Metric table endpoint handler.
//!
//! `GET /stats?filter=<substring>&units=<raw|human>` renders the latest
//! snapshot as a two-column table, filtered case-insensitively by name.

use arcstats_monitor::{QueryView, UnitMode};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use super::{no_snapshot_response, FOOTER_TEXT, TEXT_PLAIN};
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub filter: Option<String>,
    pub units: Option<String>,
}

/// Handler for the /stats endpoint.
#[instrument(skip(state))]
pub async fn stats_handler(
    State(state): State<SharedState>,
    Query(params): Query<StatsParams>,
) -> Response {
    debug!("Processing /stats request");

    let view = state.collector.view();
    let mode = match params.units.as_deref() {
        Some(s) => match s.parse::<UnitMode>() {
            Ok(mode) => mode,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, [TEXT_PLAIN], format!("{e}\n")).into_response()
            }
        },
        None => view.unit_mode(),
    };

    if view.snapshot().is_none() {
        return no_snapshot_response().into_response();
    }

    let filter = params.filter.unwrap_or_default();
    let body = render_stats(&view, &filter, mode);
    (StatusCode::OK, [TEXT_PLAIN], format!("{body}\n{FOOTER_TEXT}\n")).into_response()
}

/// Renders the filtered metric table with the summary line on top.
pub fn render_stats(view: &QueryView, filter: &str, mode: UnitMode) -> String {
    let mut out = String::new();
    let rows = view.rows(filter, mode);

    if let Some(snap) = view.snapshot() {
        writeln!(out, "Captured: {}", snap.captured_at().to_rfc3339()).ok();
    }
    if let Some(summary) = view.summary(mode) {
        writeln!(out, "{}", summary.render()).ok();
    }
    writeln!(out, "Health: {}", view.health_status()).ok();
    writeln!(out).ok();

    let name_w = rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("Metric".len());

    writeln!(out, "{:name_w$} | {:>20}", "Metric", "Value").ok();
    writeln!(out, "{}", "-".repeat(name_w + 23)).ok();
    for row in &rows {
        writeln!(out, "{:name_w$} | {:>20}", row.name, row.value).ok();
    }
    writeln!(out).ok();

    if filter.is_empty() {
        writeln!(out, "{} metrics", rows.len()).ok();
    } else {
        writeln!(out, "{} metrics matching '{}'", rows.len(), filter).ok();
    }
    out
}
