//! Configuration for the ARC stats monitor.
//!
//! `Config` mirrors the on-disk file (YAML, JSON or TOML). Every field is
//! optional so that file values, CLI overrides and defaults can be layered.
//! `Config::engine_settings` validates the merged result eagerly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::units::{UnitClassifier, UnitMode};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9317;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_ACQUISITION_TIMEOUT_SECONDS: u64 = 3;
/// Retained history window when no explicit capacity is configured.
pub const DEFAULT_HISTORY_WINDOW_SECONDS: u64 = 300;
/// Hit ratio below which the health indicator turns to warning.
pub const DEFAULT_HIT_RATIO_WARNING_THRESHOLD: f64 = 0.90;

/// Config file locations tried in order when `-c` is not given.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/arcstats-monitor/config.yaml",
    "/etc/arcstats-monitor/config.yml",
    "/etc/arcstats-monitor/config.json",
    "./arcstats-monitor.yaml",
    "./arcstats-monitor.yml",
    "./arcstats-monitor.json",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub enable_http: Option<bool>,

    // Collection
    #[serde(alias = "poll-interval-seconds")]
    pub poll_interval_seconds: Option<u64>,
    /// Number of retained history points (derived from the interval if unset)
    #[serde(alias = "history-capacity")]
    pub history_capacity: Option<usize>,
    #[serde(alias = "acquisition-timeout-seconds")]
    pub acquisition_timeout_seconds: Option<u64>,
    /// "auto" | "kstat" | "sysctl" | "file"
    pub source: Option<String>,
    #[serde(alias = "source-path")]
    pub source_path: Option<PathBuf>,

    // Presentation
    #[serde(alias = "hit-ratio-warning-threshold")]
    pub hit_ratio_warning_threshold: Option<f64>,
    /// "raw" | "human"
    #[serde(alias = "unit-mode")]
    pub unit_mode: Option<String>,
    /// Metric names always rendered as bytes
    #[serde(alias = "byte-metrics")]
    pub byte_metrics: Option<Vec<String>>,
    /// Metric names always rendered as plain counts
    #[serde(alias = "count-metrics")]
    pub count_metrics: Option<Vec<String>>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            enable_http: Some(true),
            poll_interval_seconds: Some(DEFAULT_POLL_INTERVAL_SECONDS),
            history_capacity: None,
            acquisition_timeout_seconds: Some(DEFAULT_ACQUISITION_TIMEOUT_SECONDS),
            source: Some("auto".into()),
            source_path: None,
            hit_ratio_warning_threshold: Some(DEFAULT_HIT_RATIO_WARNING_THRESHOLD),
            unit_mode: Some("human".into()),
            byte_metrics: None,
            count_metrics: None,
            log_level: Some("info".into()),
        }
    }
}

/// Where raw counters are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `kstat` on Linux, `sysctl` elsewhere.
    Auto,
    Kstat,
    Sysctl,
    File,
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SourceKind::Auto),
            "kstat" => Ok(SourceKind::Kstat),
            "sysctl" => Ok(SourceKind::Sysctl),
            "file" => Ok(SourceKind::File),
            other => Err(ConfigError::InvalidSource(other.to_string())),
        }
    }
}

/// Validated engine parameters.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub history_capacity: usize,
    pub acquisition_timeout: Duration,
    pub hit_ratio_warning_threshold: f64,
    pub unit_mode: UnitMode,
    pub classifier: UnitClassifier,
    pub source: SourceKind,
    pub source_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
            history_capacity: default_history_capacity(DEFAULT_POLL_INTERVAL_SECONDS),
            acquisition_timeout: Duration::from_secs(DEFAULT_ACQUISITION_TIMEOUT_SECONDS),
            hit_ratio_warning_threshold: DEFAULT_HIT_RATIO_WARNING_THRESHOLD,
            unit_mode: UnitMode::Human,
            classifier: UnitClassifier::new(),
            source: SourceKind::Auto,
            source_path: None,
        }
    }
}

impl EngineSettings {
    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_interval(self.poll_interval)?;
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.acquisition_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        validate_threshold(self.hit_ratio_warning_threshold)?;
        if self.source == SourceKind::File && self.source_path.is_none() {
            return Err(ConfigError::MissingSourcePath);
        }
        Ok(())
    }
}

pub(crate) fn validate_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        Err(ConfigError::ZeroInterval)
    } else {
        Ok(())
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange(threshold))
    }
}

/// Enough points to cover the default window at the given interval.
pub fn default_history_capacity(interval_seconds: u64) -> usize {
    if interval_seconds == 0 {
        return 1;
    }
    DEFAULT_HISTORY_WINDOW_SECONDS.div_ceil(interval_seconds).max(1) as usize
}

impl Config {
    /// Validates the merged config and resolves defaults.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let interval_secs = self
            .poll_interval_seconds
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS);
        if interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let unit_mode = match self.unit_mode.as_deref() {
            Some(s) => s.parse()?,
            None => UnitMode::Human,
        };
        let source = match self.source.as_deref() {
            Some(s) => s.parse()?,
            None => SourceKind::Auto,
        };

        let classifier = UnitClassifier::new().with_overrides(
            self.byte_metrics.clone().unwrap_or_default(),
            self.count_metrics.clone().unwrap_or_default(),
        );

        let settings = EngineSettings {
            poll_interval: Duration::from_secs(interval_secs),
            history_capacity: self
                .history_capacity
                .unwrap_or_else(|| default_history_capacity(interval_secs)),
            acquisition_timeout: Duration::from_secs(
                self.acquisition_timeout_seconds
                    .unwrap_or(DEFAULT_ACQUISITION_TIMEOUT_SECONDS),
            ),
            hit_ratio_warning_threshold: self
                .hit_ratio_warning_threshold
                .unwrap_or(DEFAULT_HIT_RATIO_WARNING_THRESHOLD),
            unit_mode,
            classifier,
            source,
            source_path: self.source_path.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Loads a config file, falling back to the default locations and then to
/// built-in defaults when nothing is found.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text; the extension picks the format, YAML by default.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}
