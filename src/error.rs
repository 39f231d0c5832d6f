//! Error types for the stats engine.
//!
//! Acquisition and parse errors are recoverable: the collector records them
//! and retries on the next cycle. Configuration errors are fatal and are
//! returned synchronously before anything starts.

use thiserror::Error;

/// Failure reported by a [`StatsSource`](crate::source::StatsSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("stats source not found: {0}")]
    NotFound(String),

    #[error("permission denied reading {0}")]
    PermissionDenied(String),

    #[error("command `{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("stats source not supported on this platform: {0}")]
    Unsupported(String),

    #[error("stats source did not answer within {0} ms")]
    Timeout(u64),

    #[error("I/O error reading stats: {0}")]
    Io(String),
}

impl AcquisitionError {
    /// Maps an I/O error on `target` to the matching variant.
    pub fn from_io(err: &std::io::Error, target: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AcquisitionError::NotFound(target.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                AcquisitionError::PermissionDenied(target.to_string())
            }
            _ => AcquisitionError::Io(format!("{}: {}", target, err)),
        }
    }
}

/// Failure to turn a raw counter dump into a snapshot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("stats source returned no data")]
    SourceUnavailable,

    #[error("no valid metrics found in stats output")]
    NoValidMetrics,

    #[error("stats output is not valid UTF-8")]
    MalformedEncoding,
}

/// Invalid engine configuration. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("hit ratio warning threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("acquisition timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid unit mode '{0}', expected 'raw' or 'human'")]
    InvalidUnitMode(String),

    #[error("invalid source '{0}', expected 'auto', 'kstat', 'sysctl' or 'file'")]
    InvalidSource(String),

    #[error("source 'file' requires source_path to be set")]
    MissingSourcePath,

    #[error("collector must be started from within a tokio runtime")]
    NoRuntime,
}

/// Rejected history operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history point is older than the newest retained point")]
    OutOfOrder,

    #[error("history capacity must be at least 1")]
    ZeroCapacity,
}

/// Recoverable failure of a single poll cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl PollError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PollError::Acquisition(_) => FailureKind::Acquisition,
            PollError::Parse(_) => FailureKind::Parse,
            PollError::History(_) => FailureKind::History,
        }
    }
}

/// Category of the last recoverable poll failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Acquisition,
    Parse,
    History,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Acquisition => write!(f, "acquisition"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::History => write!(f, "history"),
        }
    }
}
