//! Unit classification and human-readable formatting.
//!
//! Which ARC metrics hold byte quantities is decided by an explicit table:
//! user overrides first, then the built-in list of known byte gauges, then a
//! name pattern (`size` / `bytes`). Everything else is a plain counter.

use ahash::AHashSet as HashSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// ARC statistics known to carry byte values.
static BUILTIN_BYTE_METRICS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "c",
        "p",
        "c_min",
        "c_max",
        "size",
        "compressed_size",
        "uncompressed_size",
        "overhead_size",
        "hdr_size",
        "data_size",
        "metadata_size",
        "dbuf_size",
        "dnode_size",
        "bonus_size",
        "anon_size",
        "mru_size",
        "mru_ghost_size",
        "mfu_size",
        "mfu_ghost_size",
        "l2_size",
        "l2_asize",
        "l2_hdr_size",
        "l2_read_bytes",
        "l2_write_bytes",
        "arc_meta_used",
        "arc_meta_limit",
        "arc_meta_max",
        "arc_meta_min",
        "arc_dnode_limit",
        "arc_sys_free",
        "memory_all_bytes",
        "memory_free_bytes",
        "memory_available_bytes",
        "evict_l2_cached",
        "evict_l2_eligible",
        "evict_l2_ineligible",
    ]
    .into_iter()
    .collect()
});

/// Display mode for metric values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitMode {
    Raw,
    #[default]
    Human,
}

impl FromStr for UnitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(UnitMode::Raw),
            "human" => Ok(UnitMode::Human),
            other => Err(ConfigError::InvalidUnitMode(other.to_string())),
        }
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitMode::Raw => write!(f, "raw"),
            UnitMode::Human => write!(f, "human"),
        }
    }
}

/// What a metric value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Bytes,
    Count,
}

/// Decides which metrics are rendered with byte units.
#[derive(Debug, Clone, Default)]
pub struct UnitClassifier {
    byte_overrides: HashSet<String>,
    count_overrides: HashSet<String>,
}

impl UnitClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds names forced to byte (first list) or count (second list).
    ///
    /// A name present in both lists is treated as a count.
    pub fn with_overrides<B, C>(mut self, bytes: B, counts: C) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.byte_overrides.extend(bytes.into_iter().map(Into::into));
        self.count_overrides.extend(counts.into_iter().map(Into::into));
        self
    }

    pub fn classify(&self, name: &str) -> MetricKind {
        if self.count_overrides.contains(name) {
            return MetricKind::Count;
        }
        if self.byte_overrides.contains(name) || BUILTIN_BYTE_METRICS.contains(name) {
            return MetricKind::Bytes;
        }
        let lower = name.to_ascii_lowercase();
        if lower.contains("size") || lower.contains("bytes") {
            MetricKind::Bytes
        } else {
            MetricKind::Count
        }
    }

    /// Formats `value` for metric `name` in the given mode.
    pub fn format_value(&self, name: &str, value: u64, mode: UnitMode) -> String {
        match (mode, self.classify(name)) {
            (UnitMode::Human, MetricKind::Bytes) => human_bytes(value),
            _ => value.to_string(),
        }
    }
}

/// Renders a byte count with 1024-based units and two decimals.
///
/// Values below 1 KB are shown as whole bytes.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
