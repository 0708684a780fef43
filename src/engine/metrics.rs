//! Run statistics: aggregation over worker counters and the periodic
//! progress reporter.

use crate::engine::worker::WorkerCounters;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Point-in-time aggregate across all workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub failed: u64,
    pub pressure: u64,
}

/// Aggregates the per-worker counters without touching the hot path;
/// workers only ever increment their own atomics.
pub struct StatsCollector {
    counters: Vec<Arc<WorkerCounters>>,
    started: Instant,
}

impl StatsCollector {
    pub fn new(counters: Vec<Arc<WorkerCounters>>) -> Self {
        Self {
            counters,
            started: Instant::now(),
        }
    }

    /// Sum the counters across all workers.
    pub fn totals(&self) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::default();
        for counters in &self.counters {
            snapshot.sent += counters.sent.load(Ordering::Relaxed);
            snapshot.failed += counters.failed.load(Ordering::Relaxed);
            snapshot.pressure += counters.pressure.load(Ordering::Relaxed);
        }
        snapshot
    }

    /// Wall-clock time since the collector was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// One progress report, derived from a snapshot and the report window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProgressLine {
    current_rate: f64,
    average_rate: f64,
    elapsed_secs: f64,
}

impl ProgressLine {
    fn new(snapshot: StatsSnapshot, last_sent: u64, window: Duration, elapsed: Duration) -> Self {
        let window_secs = window.as_secs_f64().max(f64::MIN_POSITIVE);
        let elapsed_secs = elapsed.as_secs_f64();
        Self {
            current_rate: (snapshot.sent - last_sent) as f64 / window_secs,
            average_rate: snapshot.sent as f64 / elapsed_secs.max(f64::MIN_POSITIVE),
            elapsed_secs,
        }
    }
}

/// Report progress every `interval` until cancellation, then hand the
/// collector back for the final summary.
///
/// Each line carries the rate over the last interval, the average rate
/// since start, the elapsed run time and the running totals.
pub async fn run_reporter(
    collector: StatsCollector,
    interval: Duration,
    cancel: CancellationToken,
) -> StatsCollector {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately; skip it so the first report covers a
    // full interval.
    ticker.tick().await;

    let mut last_sent = 0u64;
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return collector,
            tick = ticker.tick() => {
                let snapshot = collector.totals();
                let line = ProgressLine::new(
                    snapshot,
                    last_sent,
                    tick.duration_since(last_tick),
                    collector.elapsed(),
                );

                info!(
                    current_rate = format_args!("{:.0}", line.current_rate),
                    average_rate = format_args!("{:.0}", line.average_rate),
                    elapsed_secs = format_args!("{:.1}", line.elapsed_secs),
                    total_sent = snapshot.sent,
                    total_failed = snapshot.failed,
                    pressure = snapshot.pressure,
                    "progress"
                );

                last_sent = snapshot.sent;
                last_tick = tick;
            }
        }
    }
}
