//! Periodic alert cycle.
//!
//! One cycle fetches a donor snapshot, analyzes it, selects at most one
//! alert, filters it against user preferences and hands it to a sink. The
//! [`Worker`] repeats this on an interval until its [`WorkerHandle`] is
//! stopped. A failed cycle is logged and the next one runs as scheduled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::analysis::InventoryAnalyzer;
use crate::donor::DonorRecord;
use crate::error::Result;
use crate::notify::{AlertSink, DeliveryDecision, DeliveryFilter, NotificationChannel, SuppressReason};
use crate::selector::{welcome_alert, AlertSelector};

/// Default time between cycles: four hours.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Supplies the donor snapshot for a cycle.
#[async_trait]
pub trait DonorSource: Send {
    /// All donors currently registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read.
    async fn donors(&mut self) -> Result<Vec<DonorRecord>>;
}

/// A fixed donor snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    donors: Vec<DonorRecord>,
}

impl StaticSource {
    /// Serve `donors` on every cycle.
    #[must_use]
    pub fn new(donors: Vec<DonorRecord>) -> Self {
        Self { donors }
    }
}

#[async_trait]
impl DonorSource for StaticSource {
    async fn donors(&mut self) -> Result<Vec<DonorRecord>> {
        Ok(self.donors.clone())
    }
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Nothing was selected.
    NoAlert,

    /// An alert passed the filter and was delivered.
    Delivered {
        /// The alert.
        alert: Alert,
        /// Channel it went out on.
        channel: NotificationChannel,
    },

    /// An alert was selected but filtered out.
    Suppressed {
        /// The alert.
        alert: Alert,
        /// Why it was dropped.
        reason: SuppressReason,
    },
}

impl CycleOutcome {
    /// The selected alert, delivered or not.
    #[must_use]
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Self::NoAlert => None,
            Self::Delivered { alert, .. } | Self::Suppressed { alert, .. } => Some(alert),
        }
    }
}

/// Cloneable stop signal for a running [`Worker`].
#[derive(Debug, Clone, Default)]
pub struct WorkerHandle {
    stop_signal: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl WorkerHandle {
    /// Create a handle that has not been stopped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to stop after the current cycle.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Resolve once a stop is requested.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.should_stop() {
                return;
            }
            notified.await;
        }
    }
}

/// Counters kept by a [`Worker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Cycles attempted.
    pub cycles: u64,
    /// Alerts delivered.
    pub delivered: u64,
    /// Alerts suppressed by the filter.
    pub suppressed: u64,
    /// Cycles that failed.
    pub failures: u64,
}

/// Runs alert cycles against a donor source and an alert sink.
pub struct Worker<S, K> {
    source: S,
    sink: K,
    analyzer: InventoryAnalyzer,
    selector: AlertSelector,
    filter: DeliveryFilter,
    rng: StdRng,
    interval: Duration,
    handle: WorkerHandle,
    stats: WorkerStats,
}

impl<S, K> std::fmt::Debug for Worker<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("selector", &self.selector)
            .field("filter", &self.filter)
            .field("interval", &self.interval)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: DonorSource, K: AlertSink> Worker<S, K> {
    /// Create a worker with an entropy-seeded RNG and the default interval.
    #[must_use]
    pub fn new(source: S, sink: K, selector: AlertSelector, filter: DeliveryFilter) -> Self {
        Self {
            source,
            sink,
            analyzer: InventoryAnalyzer::new(),
            selector,
            filter,
            rng: StdRng::from_entropy(),
            interval: DEFAULT_INTERVAL,
            handle: WorkerHandle::new(),
            stats: WorkerStats::default(),
        }
    }

    /// Use a seeded RNG, making selection reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Set the time between cycles.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// A handle that stops [`Worker::run`].
    #[must_use]
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// The sink, e.g. to inspect what was delivered.
    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one cycle at `now`, given in local wall-clock time.
    ///
    /// An empty donor snapshot yields the welcome alert instead of an
    /// analysis-driven selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the donor snapshot cannot be read or the sink
    /// fails to deliver.
    pub async fn run_cycle<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<CycleOutcome> {
        self.stats.cycles += 1;
        let donors = self.source.donors().await?;

        let selected = if donors.is_empty() {
            debug!("No donors registered; sending welcome alert");
            Some(welcome_alert(now.with_timezone(&Utc)))
        } else {
            let analysis = self.analyzer.analyze(&donors, now);
            self.selector.select(&analysis, now, &mut self.rng)
        };

        let Some(alert) = selected else {
            debug!(donors = donors.len(), "Cycle selected no alert");
            return Ok(CycleOutcome::NoAlert);
        };

        match self.filter.decide_at(&alert, now) {
            DeliveryDecision::Deliver(channel) => {
                self.sink.deliver(&alert, channel).await?;
                self.stats.delivered += 1;
                info!(
                    alert_type = alert.alert_type.as_str(),
                    priority = %alert.priority,
                    channel = channel.id(),
                    "Alert delivered"
                );
                Ok(CycleOutcome::Delivered { alert, channel })
            }
            DeliveryDecision::Suppressed(reason) => {
                self.stats.suppressed += 1;
                Ok(CycleOutcome::Suppressed { alert, reason })
            }
        }
    }

    /// Run one cycle at the local wall clock, logging failures.
    pub async fn run_once(&mut self) -> Option<CycleOutcome> {
        match self.run_cycle(&Local::now()).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "Alert cycle failed");
                None
            }
        }
    }

    /// Run cycles on the interval until stopped. The first cycle runs
    /// immediately.
    pub async fn run(&mut self) -> WorkerStats {
        let handle = self.handle.clone();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Alert worker started");
        loop {
            tokio::select! {
                biased;
                () = handle.stopped() => break,
                _ = ticker.tick() => {
                    if handle.should_stop() {
                        break;
                    }
                    self.run_once().await;
                }
            }
        }
        info!(cycles = self.stats.cycles, delivered = self.stats.delivered, "Alert worker stopped");
        self.stats
    }
}
