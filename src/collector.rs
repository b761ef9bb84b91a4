// CPU usage collector and the scheduler that drives it.
// One tick = read -> stamp -> validate -> append. Tick failures are logged and dropped; the
// next tick is the only recovery. The scheduler never runs two ticks at once: a tick that
// comes due while the previous one is still in flight is skipped.

use chrono::NaiveDateTime;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::error::CollectError;
use crate::models::{Sample, timefmt};
use crate::reader::{self, MetricReader};
use crate::store::SampleStore;
use crate::validator::Validator;

/// Fires at second 0 of every minute, local time.
pub const EVERY_MINUTE: &str = "0 * * * * *";

pub struct Collector {
    reader: Arc<dyn MetricReader>,
    store: Arc<dyn SampleStore>,
    validator: Validator,
    clock: fn() -> NaiveDateTime,
}

impl Collector {
    pub fn new(
        reader: Arc<dyn MetricReader>,
        store: Arc<dyn SampleStore>,
        validator: Validator,
    ) -> Self {
        Self {
            reader,
            store,
            validator,
            clock: timefmt::local_now,
        }
    }

    /// Replace the wall clock used to stamp samples.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// One collection pass. Writes zero or one sample.
    pub async fn tick(&self) -> Result<Sample, CollectError> {
        let reading = reader::read_blocking(self.reader.clone()).await?;
        let sample = Sample::new(reading, (self.clock)());
        self.record(Some(sample)).await?;
        Ok(sample)
    }

    /// Validate and append. An absent sample is rejected before the store is touched.
    pub async fn record(&self, sample: Option<Sample>) -> Result<(), CollectError> {
        self.validator.validate(sample.as_ref())?;
        if let Some(sample) = sample {
            self.store.append(&sample).await?;
        }
        Ok(())
    }

    /// `tick` with logging and counters; never returns an error to the scheduler.
    pub async fn run_tick(&self, stats: &CollectorStats) {
        match self.tick().await {
            Ok(sample) => {
                stats.ok.fetch_add(1, Ordering::Relaxed);
                debug!(
                    operation = "collect",
                    recorded_at = %sample.recorded_at,
                    user = sample.user_usage,
                    system = sample.system_usage,
                    idle = sample.idle_usage,
                    "CPU usage sample saved"
                );
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                let operation = match &e {
                    CollectError::Read(_) => "read_cpu_usage",
                    CollectError::InvalidData(_) => "validate_sample",
                    CollectError::Storage(_) => "append_sample",
                };
                error!(
                    error = %e,
                    operation,
                    reader = self.reader.name(),
                    "Error while collecting CPU usage data"
                );
            }
        }
    }
}

/// Tick counters shared between the scheduler task and its handle.
#[derive(Debug, Default)]
pub struct CollectorStats {
    ok: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectorStatsSnapshot {
    pub ticks_ok: u64,
    pub ticks_failed: u64,
    pub ticks_skipped: u64,
}

impl CollectorStats {
    pub fn snapshot(&self) -> CollectorStatsSnapshot {
        CollectorStatsSnapshot {
            ticks_ok: self.ok.load(Ordering::Relaxed),
            ticks_failed: self.failed.load(Ordering::Relaxed),
            ticks_skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// When ticks come due: a local-time cron schedule, or a fixed period.
#[derive(Debug, Clone)]
pub enum Cadence {
    Cron(Box<cron::Schedule>),
    Every(Duration),
}

impl Cadence {
    pub fn cron(expr: &str) -> anyhow::Result<Self> {
        let schedule = cron::Schedule::from_str(expr)
            .map_err(|e| anyhow::anyhow!("invalid cron expression `{}`: {}", expr, e))?;
        Ok(Cadence::Cron(Box::new(schedule)))
    }

    /// Time until the next tick, or `None` if the schedule has no future firings.
    pub fn next_delay(&self) -> Option<Duration> {
        match self {
            Cadence::Cron(schedule) => {
                let now = chrono::Local::now();
                let next = schedule.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::from_millis(1)))
            }
            Cadence::Every(period) => Some(*period),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub cadence: Cadence,
    /// How often to log tick counters at INFO level.
    pub stats_log_interval: Duration,
}

/// Owned handle to a running collector schedule.
pub struct CollectorScheduler {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
    stats: Arc<CollectorStats>,
}

impl CollectorScheduler {
    /// Spawns the schedule loop on the current runtime.
    pub fn start(collector: Arc<Collector>, config: SchedulerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let stats = Arc::new(CollectorStats::default());
        let join = tokio::spawn(run(collector, config, stats.clone(), shutdown_rx));
        Self {
            shutdown_tx: Some(shutdown_tx),
            join,
            stats,
        }
    }

    pub fn stats(&self) -> CollectorStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops scheduling and waits for an in-flight tick to finish. Readers have no deadline of
    /// their own, so a hung metric command makes this wait forever; see `stop_within`.
    pub async fn stop(mut self) -> CollectorStatsSnapshot {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            warn!(error = %e, "collector scheduler task ended abnormally");
        }
        self.stats.snapshot()
    }

    /// Like `stop`, but gives up on the in-flight tick after `grace` and aborts the schedule
    /// task. The abandoned tick's sample is lost; its blocking read is left to finish on its own.
    pub async fn stop_within(mut self, grace: Duration) -> CollectorStatsSnapshot {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "collector scheduler task ended abnormally"),
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "collector tick still running at shutdown; abandoning it"
                );
                self.join.abort();
            }
        }
        self.stats.snapshot()
    }
}

async fn run(
    collector: Arc<Collector>,
    config: SchedulerConfig,
    stats: Arc<CollectorStats>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let busy = Arc::new(Mutex::new(()));
    let mut in_flight: JoinSet<()> = JoinSet::new();
    let mut stats_log_tick = tokio::time::interval(config.stats_log_interval);
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First interval tick completes immediately; nothing to report yet.
    stats_log_tick.tick().await;

    loop {
        while in_flight.try_join_next().is_some() {}

        let Some(delay) = config.cadence.next_delay() else {
            warn!("collector schedule has no future firings; stopping");
            break;
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match busy.clone().try_lock_owned() {
                    Ok(guard) => {
                        let collector = collector.clone();
                        let stats = stats.clone();
                        in_flight.spawn(async move {
                            let _guard = guard;
                            collector.run_tick(&stats).await;
                        });
                    }
                    Err(_) => {
                        stats.skipped.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            operation = "collect",
                            "previous collection tick still running; dropping this tick"
                        );
                    }
                }
            }
            _ = stats_log_tick.tick() => {
                let s = stats.snapshot();
                info!(
                    ticks_ok = s.ticks_ok,
                    ticks_failed = s.ticks_failed,
                    ticks_skipped = s.ticks_skipped,
                    "collector stats"
                );
            }
            _ = &mut shutdown_rx => {
                debug!("Collector scheduler shutting down");
                break;
            }
        }
    }

    while in_flight.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_delay_is_at_most_one_minute() {
        let cadence = Cadence::cron(EVERY_MINUTE).unwrap();
        assert!(matches!(cadence, Cadence::Cron(_)));
        let delay = cadence.next_delay().unwrap();
        assert!(delay <= Duration::from_secs(60));
    }

    #[test]
    fn invalid_cron_is_rejected() {
        assert!(Cadence::cron("not a schedule").is_err());
    }
}
