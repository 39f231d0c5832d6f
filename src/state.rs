//! Application state management for the monitor.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers alongside the running collector.

use arcstats_monitor::{Collector, Config};
use std::sync::Arc;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and the collector task.
pub struct AppState {
    pub collector: Collector,
    pub config: Arc<Config>,
}
