//! ZFS ARC statistics collection and history engine.
//!
//! Raw counter dumps come from a [`source::StatsSource`], are parsed into an
//! immutable [`snapshot::MetricSnapshot`], appended to a bounded
//! [`history::HistoryBuffer`] and published by the [`collector::Collector`].
//! Presentation code reads everything through [`query::QueryView`].

pub mod collector;
pub mod config;
pub mod error;
pub mod health_stats;
pub mod history;
pub mod parser;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod units;

pub use collector::{Collector, EngineState, LastError, PollOutcome};
pub use config::{Config, EngineSettings};
pub use error::{AcquisitionError, ConfigError, HistoryError, ParseFailure, PollError};
pub use history::{HistoryBuffer, HistoryPoint};
pub use query::{HealthStatus, QueryView, Summary};
pub use snapshot::{Metric, MetricSnapshot};
pub use source::StatsSource;
pub use units::UnitMode;
