//! Documentation endpoint handler.
//!
//! This module provides the `/doc` endpoint handler that describes the
//! endpoints, configuration keys and CLI commands of the monitor.

use arcstats_monitor::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use super::{FOOTER_TEXT, TEXT_PLAIN};
use crate::state::SharedState;

/// Handler for the /doc endpoint.
#[instrument(skip(state))]
pub async fn doc_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /doc request");

    let version = env!("CARGO_PKG_VERSION");
    let settings = state.collector.settings();
    let doc = format!(
        r#"ARCSTATS MONITOR - DOCUMENTATION
================================

VERSION: {version}
DESCRIPTION: Periodic ZFS ARC statistics sampler with rolling hit-ratio history
SOURCE: {source}
POLL INTERVAL: {interval}s
HISTORY CAPACITY: {capacity} points
LISTEN: {bind}:{port}

HTTP ENDPOINTS
--------------
GET /stats       - Metric table of the latest snapshot
                   ?filter=<text>  case-insensitive name substring
                   ?units=raw|human
GET /summary     - ARC size, hits, misses, hit ratio and health
GET /history     - Rolling hits/misses/hit-ratio series
GET /health      - Engine state, last error and poll statistics
GET /doc         - This documentation

DERIVED VALUES
--------------
hit ratio        - hits / (hits + misses), 0 when both are 0
health           - warning when the hit ratio is below the threshold,
                   unknown before the first snapshot

CONFIGURATION
-------------
Config file locations (in order):
1. CLI specified: -c /path/to/config.yaml
2. System config: /etc/arcstats-monitor/config.yaml
3. Current directory: ./arcstats-monitor.yaml

Key configuration options:
- poll_interval_seconds: Seconds between polls (default: 5)
- history_capacity: Retained points (default: enough for 300s)
- hit_ratio_warning_threshold: Warning threshold (default: 0.90)
- unit_mode: raw | human (default: human)
- acquisition_timeout_seconds: Source timeout (default: 3)
- source: auto | kstat | sysctl | file (default: auto)
- source_path: Path for the kstat or file source
- byte_metrics / count_metrics: Unit classification overrides
- bind / port: HTTP listen address (default: 127.0.0.1:9317)

CLI COMMANDS
------------
arcstats-monitor                        - Start collecting and serve the view
arcstats-monitor check                  - Validate config and stats source
arcstats-monitor config -o config.yaml  - Generate config file
arcstats-monitor test -n 3              - Poll a few times and print results
arcstats-monitor generate-sample        - Write a synthetic arcstats dump
arcstats-monitor --help                 - Show all CLI options

EXAMPLE USAGE
-------------
# Serve statistics from a recorded dump
arcstats-monitor --source file --source-path arcstats-sample.txt

# Show all demand counters in raw units
curl 'http://localhost:9317/stats?filter=demand&units=raw'

{FOOTER_TEXT}
"#,
        source = state.collector.source_description(),
        interval = settings.poll_interval.as_secs(),
        capacity = state.collector.history_capacity(),
        bind = state.config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR),
        port = state.config.port.unwrap_or(DEFAULT_PORT),
    );

    (StatusCode::OK, [TEXT_PLAIN], doc)
}
