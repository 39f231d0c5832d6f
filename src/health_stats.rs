//! Running statistics about the poll loop itself.
//!
//! Tracks per-poll duration and metric counts plus success/failure counters,
//! and renders them as a plain-text table for the `/health` endpoint.

use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Clone, Copy, Default)]
struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Current/average/max/min of one sampled quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatSummary {
    pub current: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub samples: u64,
}

#[derive(Default)]
struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    fn summary(&self) -> StatSummary {
        match self.inner.lock() {
            Ok(s) => StatSummary {
                current: s.last,
                average: s.avg(),
                max: s.max,
                min: s.min,
                samples: s.count,
            },
            Err(_) => StatSummary::default(),
        }
    }
}

/// Point-in-time copy of all poll statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollStats {
    pub poll_duration_seconds: StatSummary,
    pub metrics_per_snapshot: StatSummary,
    pub total_polls: u64,
    pub failed_polls: u64,
    pub skipped_polls: u64,
    pub consecutive_failures: u64,
    pub uptime_seconds: u64,
}

pub struct HealthStats {
    poll_duration_seconds: Stat,
    metrics_per_snapshot: Stat,
    total_polls: AtomicU64,
    failed_polls: AtomicU64,
    skipped_polls: AtomicU64,
    consecutive_failures: AtomicU64,
    started: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            poll_duration_seconds: Stat::default(),
            metrics_per_snapshot: Stat::default(),
            total_polls: AtomicU64::new(0),
            failed_polls: AtomicU64::new(0),
            skipped_polls: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            started: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_success(&self, metrics: usize, duration_seconds: f64) {
        self.poll_duration_seconds.add_sample(duration_seconds);
        self.metrics_per_snapshot.add_sample(metrics as f64);
        self.total_polls.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    pub fn record_failure(&self, duration_seconds: f64) {
        self.poll_duration_seconds.add_sample(duration_seconds);
        self.total_polls.fetch_add(1, Ordering::Relaxed);
        self.failed_polls.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollStats {
        PollStats {
            poll_duration_seconds: self.poll_duration_seconds.summary(),
            metrics_per_snapshot: self.metrics_per_snapshot.summary(),
            total_polls: self.total_polls.load(Ordering::Relaxed),
            failed_polls: self.failed_polls.load(Ordering::Relaxed),
            skipped_polls: self.skipped_polls.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

impl PollStats {
    pub fn render_table(&self) -> String {
        let left_col = 22usize;
        let col_w = 12usize;
        let pd = &self.poll_duration_seconds;
        let mc = &self.metrics_per_snapshot;

        let mut out = String::new();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "metric",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out, "{}", "-".repeat(left_col + 3 + (col_w + 3) * 4)).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "poll duration (s)",
            format!("{:.3}", pd.current),
            format!("{:.3}", pd.average),
            format!("{:.3}", pd.max),
            format!("{:.3}", pd.min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "metrics per snapshot",
            format!("{:.0}", mc.current),
            format!("{:.1}", mc.average),
            format!("{:.0}", mc.max),
            format!("{:.0}", mc.min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "total polls: {}", self.total_polls).ok();
        writeln!(out, "failed polls: {}", self.failed_polls).ok();
        writeln!(out, "skipped polls: {}", self.skipped_polls).ok();
        writeln!(out, "consecutive failures: {}", self.consecutive_failures).ok();
        writeln!(out, "uptime (s): {}", self.uptime_seconds).ok();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        assert_eq!(s.avg(), 0.0);
        s.add(2.0);
        s.add(4.0);
        s.add(3.0);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 3.0);
        assert_eq!(s.avg(), 3.0);
    }

    #[test]
    fn test_failure_counters() {
        let stats = HealthStats::new();
        stats.record_failure(0.1);
        stats.record_failure(0.1);
        assert_eq!(stats.snapshot().consecutive_failures, 2);

        stats.record_success(120, 0.2);
        stats.record_skip();
        let snap = stats.snapshot();
        assert_eq!(snap.total_polls, 3);
        assert_eq!(snap.failed_polls, 2);
        assert_eq!(snap.skipped_polls, 1);
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.metrics_per_snapshot.current, 120.0);
    }

    #[test]
    fn test_render_table() {
        let stats = HealthStats::new();
        stats.record_success(5, 0.004);
        let table = stats.snapshot().render_table();
        assert!(table.contains("poll duration (s)"));
        assert!(table.contains("total polls: 1"));
    }
}
