//! Read-only projections over the latest snapshot and the history.
//!
//! A `QueryView` is built from immutable handles, so it can be held by a
//! presentation layer for as long as it likes without blocking the collector.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::EngineSettings;
use crate::history::HistoryPoint;
use crate::snapshot::{Metric, MetricSnapshot};
use crate::units::{UnitClassifier, UnitMode};

/// Presentation parameters shared by every view.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub hit_ratio_warning_threshold: f64,
    pub unit_mode: UnitMode,
    pub classifier: UnitClassifier,
}

impl From<&EngineSettings> for ViewSettings {
    fn from(s: &EngineSettings) -> Self {
        Self {
            hit_ratio_warning_threshold: s.hit_ratio_warning_threshold,
            unit_mode: s.unit_mode,
            classifier: s.classifier.clone(),
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        (&EngineSettings::default()).into()
    }
}

/// Health indicator derived from the hit ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    /// No snapshot has been captured yet.
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Ok => write!(f, "ok"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// `Warning` iff `hit_ratio` is strictly below `threshold`.
pub fn classify_health(hit_ratio: f64, threshold: f64) -> HealthStatus {
    if hit_ratio < threshold {
        HealthStatus::Warning
    } else {
        HealthStatus::Ok
    }
}

/// Pre-formatted summary line values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub arc_size: String,
    pub total_hits: String,
    pub total_misses: String,
    pub hit_ratio_percent: String,
}

impl Summary {
    pub fn render(&self) -> String {
        format!(
            "ARC Size: {}    Hits: {}    Misses: {}    Hit Ratio: {}",
            self.arc_size, self.total_hits, self.total_misses, self.hit_ratio_percent
        )
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub name: String,
    pub value: String,
}

/// Parallel series for a hits/misses/ratio chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Seconds relative to the newest point (newest is 0, older negative).
    pub offsets_seconds: Vec<i64>,
    pub hits: Vec<u64>,
    pub misses: Vec<u64>,
    pub hit_ratio_percent: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct QueryView {
    snapshot: Option<Arc<MetricSnapshot>>,
    history: Vec<HistoryPoint>,
    settings: Arc<ViewSettings>,
}

impl QueryView {
    pub fn new(
        snapshot: Option<Arc<MetricSnapshot>>,
        history: Vec<HistoryPoint>,
        settings: Arc<ViewSettings>,
    ) -> Self {
        Self {
            snapshot,
            history,
            settings,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<MetricSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn history(&self) -> &[HistoryPoint] {
        &self.history
    }

    /// Unit mode configured for this view.
    pub fn unit_mode(&self) -> UnitMode {
        self.settings.unit_mode
    }

    /// Metrics whose name contains `substring`, ignoring case, in source order.
    pub fn filter(&self, substring: &str) -> Vec<&Metric> {
        let Some(snap) = &self.snapshot else {
            return Vec::new();
        };
        if substring.is_empty() {
            return snap.metrics().iter().collect();
        }
        let needle = substring.to_lowercase();
        snap.metrics()
            .iter()
            .filter(|m| m.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn format(&self, metric: &Metric, mode: UnitMode) -> String {
        self.settings
            .classifier
            .format_value(&metric.name, metric.value, mode)
    }

    /// Filtered and formatted table rows.
    pub fn rows(&self, substring: &str, mode: UnitMode) -> Vec<Row> {
        self.filter(substring)
            .into_iter()
            .map(|m| Row {
                name: m.name.clone(),
                value: self.format(m, mode),
            })
            .collect()
    }

    pub fn health_status(&self) -> HealthStatus {
        match &self.snapshot {
            Some(snap) => classify_health(
                snap.derived().hit_ratio,
                self.settings.hit_ratio_warning_threshold,
            ),
            None => HealthStatus::Unknown,
        }
    }

    /// Summary values, or `None` before the first snapshot.
    pub fn summary(&self, mode: UnitMode) -> Option<Summary> {
        let snap = self.snapshot.as_ref()?;
        let d = snap.derived();
        let arc_size = match mode {
            UnitMode::Human => crate::units::human_bytes(d.arc_size),
            UnitMode::Raw => format!("{} B", d.arc_size),
        };
        Some(Summary {
            arc_size,
            total_hits: d.total_hits.to_string(),
            total_misses: d.total_misses.to_string(),
            hit_ratio_percent: format!("{:.2}%", d.hit_ratio * 100.0),
        })
    }

    pub fn chart_series(&self) -> ChartSeries {
        let Some(newest) = self.history.last() else {
            return ChartSeries::default();
        };
        let mut series = ChartSeries::default();
        for p in &self.history {
            series
                .offsets_seconds
                .push((p.timestamp - newest.timestamp).num_seconds());
            series.hits.push(p.hits);
            series.misses.push(p.misses);
            series.hit_ratio_percent.push(p.hit_ratio * 100.0);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use chrono::{Duration, Utc};

    const DUMP: &str = "\
hits 4 1500
misses 4 100
demand_data_hits 4 900
prefetch_metadata_hits 4 12
size 4 1073741824
c_max 4 8589934592
";

    fn view_of(raw: &str) -> QueryView {
        let snap = parse(raw, Utc::now()).unwrap();
        QueryView::new(Some(Arc::new(snap)), Vec::new(), Arc::new(ViewSettings::default()))
    }

    fn names(metrics: Vec<&Metric>) -> Vec<&str> {
        metrics.into_iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_filter_empty_returns_all_in_order() {
        let view = view_of(DUMP);
        assert_eq!(
            names(view.filter("")),
            vec![
                "hits",
                "misses",
                "demand_data_hits",
                "prefetch_metadata_hits",
                "size",
                "c_max"
            ]
        );
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let view = view_of("arc_hits 4 1\nmisses 4 2\n");
        assert_eq!(names(view.filter("HIT")), vec!["arc_hits"]);

        let view = view_of(DUMP);
        assert_eq!(
            names(view.filter("Hits")),
            vec!["hits", "demand_data_hits", "prefetch_metadata_hits"]
        );
        assert!(view.filter("nothing").is_empty());
    }

    #[test]
    fn test_filter_without_snapshot() {
        let view = QueryView::new(None, Vec::new(), Arc::new(ViewSettings::default()));
        assert!(view.filter("").is_empty());
        assert_eq!(view.health_status(), HealthStatus::Unknown);
        assert!(view.summary(UnitMode::Human).is_none());
    }

    #[test]
    fn test_format_modes() {
        let view = view_of(DUMP);
        let size = view.snapshot().unwrap().get("size").unwrap().clone();
        assert_eq!(view.format(&size, UnitMode::Human), "1.00 GB");
        assert_eq!(view.format(&size, UnitMode::Raw), "1073741824");

        let hits = view.snapshot().unwrap().get("hits").unwrap().clone();
        assert_eq!(view.format(&hits, UnitMode::Human), "1500");
    }

    #[test]
    fn test_rows() {
        let view = view_of(DUMP);
        let rows = view.rows("c_", UnitMode::Human);
        assert_eq!(
            rows,
            vec![Row {
                name: "c_max".into(),
                value: "8.00 GB".into()
            }]
        );
    }

    #[test]
    fn test_health_threshold_boundary() {
        assert_eq!(classify_health(0.90, 0.90), HealthStatus::Ok);
        assert_eq!(classify_health(0.8999, 0.90), HealthStatus::Warning);
        assert_eq!(classify_health(1.0, 0.90), HealthStatus::Ok);
        assert_eq!(classify_health(0.0, 0.90), HealthStatus::Warning);

        // 90 hits, 10 misses is exactly 0.90.
        assert_eq!(view_of("hits 4 90\nmisses 4 10\n").health_status(), HealthStatus::Ok);
        assert_eq!(
            view_of("hits 4 89\nmisses 4 11\n").health_status(),
            HealthStatus::Warning
        );
    }

    #[test]
    fn test_summary() {
        let view = view_of(DUMP);
        let s = view.summary(UnitMode::Human).unwrap();
        assert_eq!(s.arc_size, "1.00 GB");
        assert_eq!(s.total_hits, "1500");
        assert_eq!(s.total_misses, "100");
        assert_eq!(s.hit_ratio_percent, "93.75%");
        assert_eq!(
            s.render(),
            "ARC Size: 1.00 GB    Hits: 1500    Misses: 100    Hit Ratio: 93.75%"
        );
        assert_eq!(view.summary(UnitMode::Raw).unwrap().arc_size, "1073741824 B");
    }

    #[test]
    fn test_chart_series_offsets() {
        let base = Utc::now();
        let history: Vec<HistoryPoint> = (0..3)
            .map(|i| HistoryPoint {
                timestamp: base + Duration::seconds(i * 5),
                hits: 100 + i as u64,
                misses: i as u64,
                hit_ratio: 0.5,
            })
            .collect();
        let view = QueryView::new(None, history, Arc::new(ViewSettings::default()));
        let series = view.chart_series();
        assert_eq!(series.offsets_seconds, vec![-10, -5, 0]);
        assert_eq!(series.hits, vec![100, 101, 102]);
        assert_eq!(series.hit_ratio_percent, vec![50.0, 50.0, 50.0]);
    }
}
