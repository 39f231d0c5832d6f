//! Poll loop driving acquisition, parsing and history.
//!
//! The `Collector` owns the latest-snapshot slot and the history buffer.
//! It is the only writer; readers get immutable handles or copies.
//!
//! Lifecycle is `Idle` until `start`, `Running` until `stop`. A manual
//! `poll` is allowed in either state. Only one poll runs at a time: a tick or
//! manual call that arrives while a poll is in flight is skipped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock as StdRwLock, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::{validate_interval, EngineSettings};
use crate::error::{AcquisitionError, ConfigError, FailureKind, HistoryError, PollError};
use crate::health_stats::{HealthStats, PollStats};
use crate::history::{HistoryBuffer, HistoryPoint};
use crate::parser;
use crate::query::{QueryView, ViewSettings};
use crate::snapshot::MetricSnapshot;
use crate::source::StatsSource;

/// Operating state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
}

/// Most recent recoverable failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastError {
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Result of one `poll` call.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Updated(Arc<MetricSnapshot>),
    Failed(LastError),
    /// Another poll was already in flight.
    Skipped,
}

struct Runner {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct Inner {
    source: Arc<dyn StatsSource>,
    settings: EngineSettings,
    view_settings: Arc<ViewSettings>,
    history: StdRwLock<HistoryBuffer>,
    latest: watch::Sender<Option<Arc<MetricSnapshot>>>,
    last_error: StdRwLock<Option<LastError>>,
    in_flight: AtomicBool,
    /// Set while a blocking read is running, including one a timed-out
    /// poll left behind.
    acquiring: Arc<AtomicBool>,
    health: HealthStats,
    runner: Mutex<Option<Runner>>,
}

/// Cheap-to-clone handle to the collection engine.
#[derive(Clone)]
pub struct Collector {
    inner: Arc<Inner>,
}

/// Clears the in-flight flag when a poll ends, even if its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owned by the blocking read; clears the flag when the read returns.
struct AcquiringGuard(Arc<AtomicBool>);

impl Drop for AcquiringGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Collector {
    /// Creates an idle collector. Settings are validated eagerly.
    pub fn new(
        source: Arc<dyn StatsSource>,
        settings: EngineSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let history =
            HistoryBuffer::new(settings.history_capacity).map_err(|_| ConfigError::ZeroCapacity)?;
        let (latest, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(Inner {
                source,
                view_settings: Arc::new(ViewSettings::from(&settings)),
                settings,
                history: StdRwLock::new(history),
                latest,
                last_error: StdRwLock::new(None),
                in_flight: AtomicBool::new(false),
                acquiring: Arc::new(AtomicBool::new(false)),
                health: HealthStats::new(),
                runner: Mutex::new(None),
            }),
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    pub fn source_description(&self) -> String {
        self.inner.source.describe()
    }

    /// Runs one acquisition/parse/append cycle.
    ///
    /// Failures are recorded and leave the latest snapshot and history as
    /// they were.
    #[instrument(skip(self))]
    pub async fn poll(&self) -> PollOutcome {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Poll already in flight, skipping");
            self.inner.health.record_skip();
            return PollOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.inner.in_flight);

        if self.inner.acquiring.load(Ordering::Acquire) {
            debug!("Previous acquisition still running, skipping");
            self.inner.health.record_skip();
            return PollOutcome::Skipped;
        }

        let start = Instant::now();
        match self.cycle().await {
            Ok(snapshot) => {
                let elapsed = start.elapsed();
                self.inner
                    .health
                    .record_success(snapshot.len(), elapsed.as_secs_f64());
                debug!(
                    "Poll completed: {} metrics, hit ratio {:.4}, {:.2}ms",
                    snapshot.len(),
                    snapshot.derived().hit_ratio,
                    elapsed.as_secs_f64() * 1000.0
                );
                PollOutcome::Updated(snapshot)
            }
            Err(e) => {
                self.inner
                    .health
                    .record_failure(start.elapsed().as_secs_f64());
                let record = LastError {
                    kind: e.kind(),
                    message: e.to_string(),
                    at: Utc::now(),
                };
                warn!("Poll failed ({}): {}", record.kind, record.message);
                *self
                    .inner
                    .last_error
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
                PollOutcome::Failed(record)
            }
        }
    }

    async fn cycle(&self) -> Result<Arc<MetricSnapshot>, PollError> {
        let raw = self.fetch().await?;

        // Only one cycle runs at a time, so the newest point cannot move
        // between this read and the append below.
        let captured_at = {
            let now = Utc::now();
            match self.read_history().latest() {
                Some(last) if last.timestamp > now => last.timestamp,
                _ => now,
            }
        };

        let snapshot = Arc::new(parser::parse_bytes(&raw, captured_at)?);
        let report = snapshot.report();
        if report.defects() > 0 {
            debug!(
                "Skipped {} malformed and {} duplicate lines",
                report.malformed_lines, report.duplicate_names
            );
        }

        {
            let mut history = self.write_history();
            history.append(HistoryPoint::from(snapshot.as_ref()))?;
            self.inner.latest.send_replace(Some(snapshot.clone()));
        }

        Ok(snapshot)
    }

    async fn fetch(&self) -> Result<Vec<u8>, AcquisitionError> {
        let source = self.inner.source.clone();
        let timeout = self.inner.settings.acquisition_timeout;

        // Polls are serialized by `in_flight`, so nothing else sets this flag.
        self.inner.acquiring.store(true, Ordering::Release);
        let guard = AcquiringGuard(self.inner.acquiring.clone());
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            source.fetch_raw()
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AcquisitionError::Io(format!("acquisition task failed: {}", e))),
            Err(_) => Err(AcquisitionError::Timeout(timeout.as_millis() as u64)),
        }
    }

    /// Starts periodic polling at the configured interval.
    pub fn start(&self) -> Result<(), ConfigError> {
        self.start_with_interval(self.inner.settings.poll_interval)
    }

    /// Starts periodic polling. The first poll fires immediately.
    ///
    /// Fails with `NoRuntime` outside a tokio runtime. Calling it while
    /// already running does nothing.
    pub fn start_with_interval(&self, period: Duration) -> Result<(), ConfigError> {
        validate_interval(period)?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let mut runner = self
            .inner
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if runner.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            warn!("Collector already running, ignoring start");
            return Ok(());
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "Collector started with {:.3}s interval",
                period.as_secs_f64()
            );

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                // Polls are awaited outside the select so stop() never aborts one.
                Collector { inner }.poll().await;
            }

            info!("Collector stopped");
        });

        *runner = Some(Runner { shutdown, handle });
        Ok(())
    }

    /// Cancels future polls. An in-flight poll is allowed to finish.
    ///
    /// Returns whether the collector was running.
    pub fn stop(&self) -> bool {
        match self.take_runner() {
            Some(runner) => {
                let _ = runner.shutdown.send(true);
                !runner.handle.is_finished()
            }
            None => false,
        }
    }

    /// Stops polling and waits for the loop, including any in-flight poll,
    /// to finish.
    pub async fn shutdown(&self) {
        if let Some(runner) = self.take_runner() {
            let _ = runner.shutdown.send(true);
            if let Err(e) = runner.handle.await {
                warn!("Collector task ended abnormally: {}", e);
            }
        }
    }

    fn take_runner(&self) -> Option<Runner> {
        self.inner
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn state(&self) -> EngineState {
        let runner = self
            .inner
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match runner.as_ref() {
            Some(r) if !r.handle.is_finished() => EngineState::Running,
            _ => EngineState::Idle,
        }
    }

    pub fn latest_snapshot(&self) -> Option<Arc<MetricSnapshot>> {
        self.inner.latest.borrow().clone()
    }

    /// Receiver notified every time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<MetricSnapshot>>> {
        self.inner.latest.subscribe()
    }

    /// Copy of the history, oldest to newest.
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.read_history().snapshot_all()
    }

    pub fn history_len(&self) -> usize {
        self.read_history().len()
    }

    pub fn history_capacity(&self) -> usize {
        self.read_history().capacity()
    }

    /// Resizes the history window. Shrinking drops the oldest points.
    pub fn set_history_capacity(&self, capacity: usize) -> Result<(), HistoryError> {
        self.write_history().set_capacity(capacity)?;
        info!("History capacity set to {}", capacity);
        Ok(())
    }

    pub fn clear_history(&self) {
        self.write_history().clear();
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.inner
            .last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn poll_stats(&self) -> PollStats {
        self.inner.health.snapshot()
    }

    /// Consistent read-only view of the latest snapshot and the history.
    pub fn view(&self) -> QueryView {
        let history = self.read_history();
        QueryView::new(
            self.inner.latest.borrow().clone(),
            history.snapshot_all(),
            self.inner.view_settings.clone(),
        )
    }

    fn read_history(&self) -> std::sync::RwLockReadGuard<'_, HistoryBuffer> {
        self.inner
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_history(&self) -> std::sync::RwLockWriteGuard<'_, HistoryBuffer> {
        self.inner
            .history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
