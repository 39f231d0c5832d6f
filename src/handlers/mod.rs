//! HTTP endpoint handlers for the monitor.
//!
//! All endpoints are read-only plain-text views over the collector:
//! - `/stats`: Filtered metric table of the latest snapshot
//! - `/summary`: One-line summary and health indicator
//! - `/history`: Rolling hits/misses/hit-ratio series
//! - `/health`: Engine health and poll statistics
//! - `/doc`: Documentation endpoint

use axum::http::StatusCode;

pub mod doc;
pub mod health;
pub mod history;
pub mod stats;
pub mod summary;

// Re-export handlers
pub use doc::doc_handler;
pub use health::health_handler;
pub use history::history_handler;
pub use stats::stats_handler;
pub use summary::summary_handler;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "arcstats-monitor - read-only ZFS ARC statistics view";

/// Content type shared by every endpoint.
pub const TEXT_PLAIN: (&str, &str) = ("Content-Type", "text/plain; charset=utf-8");

/// Body returned before the first successful poll.
pub(crate) fn no_snapshot_response() -> (StatusCode, [(&'static str, &'static str); 1], String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [TEXT_PLAIN],
        format!("No snapshot captured yet\n\n{FOOTER_TEXT}\n"),
    )
}
