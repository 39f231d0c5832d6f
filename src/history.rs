//! Fixed-capacity rolling history of hit/miss points for charting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::error::HistoryError;
use crate::snapshot::MetricSnapshot;

/// One chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

impl From<&MetricSnapshot> for HistoryPoint {
    fn from(snap: &MetricSnapshot) -> Self {
        let d = snap.derived();
        Self {
            timestamp: snap.captured_at(),
            hits: d.total_hits,
            misses: d.total_misses,
            hit_ratio: d.hit_ratio,
        }
    }
}

/// Time-ordered ring of points, oldest evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends a point, evicting the oldest one when full.
    ///
    /// Points older than the newest retained point are rejected and leave
    /// the buffer unchanged.
    pub fn append(&mut self, point: HistoryPoint) -> Result<(), HistoryError> {
        if let Some(last) = self.points.back() {
            if point.timestamp < last.timestamp {
                return Err(HistoryError::OutOfOrder);
            }
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        Ok(())
    }

    /// Independent copy of all points, oldest to newest.
    pub fn snapshot_all(&self) -> Vec<HistoryPoint> {
        self.points.iter().copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity. Shrinking drops the oldest points.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        while self.points.len() > capacity {
            self.points.pop_front();
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }
}
