//! Run coordination: worker pool lifecycle, duration handling and shutdown.

pub mod delivery;
pub mod metrics;
pub mod planner;
pub mod worker;

use crate::config::Config;
use anyhow::Context;
use delivery::DeliveryClient;
use metrics::{run_reporter, StatsCollector};
use std::sync::Arc;
use std::time::Duration;
use streamsim_generator::MessageSynthesizer;
use streamsim_transport::{DeliveryError, DeliveryTransport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use worker::{Worker, WorkerCounters};

/// Final run statistics, logged and returned to the caller.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub sent: u64,
    pub failed: u64,
    pub pressure: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Average delivered rate over the whole run, in messages/second.
    pub fn average_rate(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.sent as f64 / self.elapsed.as_secs_f64()
    }
}

/// Execute one load-generation run to completion.
///
/// Validates the configuration, spawns the planned worker pool and the
/// stats reporter, and then waits for the run to end: the configured
/// duration elapsing, external cancellation (Ctrl-C), or a fatal delivery
/// error from any worker. Shutdown is cooperative with a bounded grace
/// period; workers still running when it expires are aborted.
pub async fn run(
    config: &Config,
    transport: Arc<dyn DeliveryTransport>,
    cancel: CancellationToken,
) -> anyhow::Result<RunSummary> {
    config.validate().context("invalid configuration")?;

    let plans = planner::plan_workers(&config.simulator);
    let sim = &config.simulator;

    info!(
        target_rate = sim.target_rate,
        workers = plans.len(),
        batch_size = plans[0].batch_size,
        message_size = config.message.message_size_bytes,
        topic = %config.endpoint.topic,
        "starting run"
    );
    if sim.duration_secs > 0 {
        info!(duration_secs = sim.duration_secs, "bounded run");
    } else {
        info!("unbounded run, stop with Ctrl-C");
    }

    let mut workers = JoinSet::new();
    let mut all_counters = Vec::with_capacity(plans.len());
    for plan in plans {
        let synthesizer = MessageSynthesizer::new(config.message.clone(), sim.seed + plan.id as u64)
            .context("failed to build synthesizer")?;
        let client = DeliveryClient::new(
            Arc::clone(&transport),
            sim.retry_attempts,
            config.retry_delay(),
        );
        let counters = Arc::new(WorkerCounters::default());
        all_counters.push(Arc::clone(&counters));
        workers.spawn(Worker::new(plan, synthesizer, client, counters, cancel.clone()).run());
    }

    let reporter = tokio::spawn(run_reporter(
        StatsCollector::new(all_counters),
        config.stats_interval(),
        cancel.clone(),
    ));

    if sim.duration_secs > 0 {
        let duration = Duration::from_secs(sim.duration_secs);
        let timer_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer_cancel.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    info!("run duration elapsed");
                    timer_cancel.cancel();
                }
            }
        });
    }

    let mut fatal: Option<DeliveryError> = None;

    // Wait for the run to end. A worker exiting before cancellation can only
    // mean a fatal delivery error, which aborts the whole run.
    while !cancel.is_cancelled() {
        tokio::select! {
            _ = cancel.cancelled() => {}
            joined = workers.join_next() => match joined {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(err))) => {
                    error!(%err, "fatal delivery error, aborting run");
                    fatal.get_or_insert(err);
                    cancel.cancel();
                }
                Some(Err(join_err)) if join_err.is_cancelled() => {}
                Some(Err(join_err)) => return Err(join_err).context("worker task panicked"),
                None => break,
            },
        }
    }

    // Covers the case where every worker already exited on its own.
    cancel.cancel();

    // Drain the pool within the grace period, then abort whatever is still
    // in flight.
    let drained = tokio::time::timeout(config.grace_period(), async {
        while let Some(joined) = workers.join_next().await {
            if let Ok(Err(err)) = joined {
                fatal.get_or_insert(err);
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("grace period elapsed, aborting remaining workers");
        workers.abort_all();
        while workers.join_next().await.is_some() {}
    }

    let collector = reporter.await.context("stats reporter panicked")?;
    let totals = collector.totals();
    let summary = RunSummary {
        sent: totals.sent,
        failed: totals.failed,
        pressure: totals.pressure,
        elapsed: collector.elapsed(),
    };

    info!(
        sent = summary.sent,
        failed = summary.failed,
        pressure = summary.pressure,
        elapsed_secs = format_args!("{:.1}", summary.elapsed.as_secs_f64()),
        average_rate = format_args!("{:.0}", summary.average_rate()),
        "run finished"
    );

    match fatal {
        Some(err) => Err(err).context("run aborted by fatal delivery error"),
        None => Ok(summary),
    }
}
