//! Rolling history endpoint handler.
//!
//! Renders the retained hits, misses and hit-ratio series oldest first,
//! with time offsets relative to the newest point.

use arcstats_monitor::query::ChartSeries;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use super::{FOOTER_TEXT, TEXT_PLAIN};
use crate::state::SharedState;

/// Handler for the /history endpoint.
#[instrument(skip(state))]
pub async fn history_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /history request");

    let view = state.collector.view();
    let series = view.chart_series();
    let capacity = state.collector.history_capacity();

    (
        StatusCode::OK,
        [TEXT_PLAIN],
        format!(
            "{}\n{FOOTER_TEXT}\n",
            render_history(&series, capacity)
        ),
    )
}

pub fn render_history(series: &ChartSeries, capacity: usize) -> String {
    let mut out = String::new();
    writeln!(out, "HIT RATIO HISTORY").ok();
    writeln!(out, "=================").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "{:>10} | {:>16} | {:>16} | {:>10}",
        "Offset (s)", "Hits", "Misses", "Hit Ratio"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(63)).ok();

    let rows = series
        .offsets_seconds
        .iter()
        .zip(&series.hits)
        .zip(&series.misses)
        .zip(&series.hit_ratio_percent);
    for (((offset, hits), misses), ratio) in rows {
        writeln!(
            out,
            "{:>10} | {:>16} | {:>16} | {:>9.2}%",
            offset, hits, misses, ratio
        )
        .ok();
    }

    writeln!(out).ok();
    writeln!(
        out,
        "{} of {} points retained",
        series.offsets_seconds.len(),
        capacity
    )
    .ok();
    out
}
