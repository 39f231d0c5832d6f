//! Immutable per-poll capture of all ARC counters.
//!
//! A `MetricSnapshot` is built once by the parser and then only shared
//! behind an `Arc`. Derived fields are computed at construction time.

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counter holding the number of ARC hits.
pub const ARC_HITS: &str = "hits";
/// Counter holding the number of ARC misses.
pub const ARC_MISSES: &str = "misses";
/// Gauge holding the current ARC size in bytes.
pub const ARC_SIZE: &str = "size";

/// A named, non-negative counter or gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: u64,
}

/// Summary values computed from well-known metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Derived {
    /// hits / (hits + misses), 0 when both are zero.
    pub hit_ratio: f64,
    pub total_hits: u64,
    pub total_misses: u64,
    pub arc_size: u64,
}

impl Derived {
    fn compute(hits: u64, misses: u64, arc_size: u64) -> Self {
        Self {
            hit_ratio: hit_ratio(hits, misses),
            total_hits: hits,
            total_misses: misses,
            arc_size,
        }
    }
}

/// Line accounting for one parse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// Lines skipped because of bad arity, name or value.
    pub malformed_lines: usize,
    /// Blank lines, column headers and kstat preambles.
    pub header_lines: usize,
    /// Repeated names; the first occurrence is kept.
    pub duplicate_names: usize,
}

impl ParseReport {
    /// Number of recoverable defects found in the input.
    pub fn defects(&self) -> usize {
        self.malformed_lines + self.duplicate_names
    }
}

/// One fully parsed capture.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    captured_at: DateTime<Utc>,
    metrics: Vec<Metric>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    derived: Derived,
    report: ParseReport,
}

impl MetricSnapshot {
    /// Builds a snapshot from metrics in source order.
    ///
    /// Callers must pass unique names; the parser guarantees this.
    pub(crate) fn new(
        captured_at: DateTime<Utc>,
        metrics: Vec<Metric>,
        report: ParseReport,
    ) -> Self {
        let index: HashMap<String, usize> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();

        let lookup = |name: &str| index.get(name).map(|&i| metrics[i].value).unwrap_or(0);
        let derived = Derived::compute(lookup(ARC_HITS), lookup(ARC_MISSES), lookup(ARC_SIZE));

        Self {
            captured_at,
            metrics,
            index,
            derived,
            report,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// All metrics in source order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.index.get(name).map(|&i| &self.metrics[i])
    }

    pub fn value(&self, name: &str) -> Option<u64> {
        self.get(name).map(|m| m.value)
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Hit ratio in [0, 1]; exactly 0 when there was no traffic.
pub fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits as u128 + misses as u128;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
