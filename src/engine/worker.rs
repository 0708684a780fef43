//! Rate-paced generation workers.

use crate::engine::delivery::{BatchOutcome, DeliveryClient};
use crate::engine::planner::WorkerPlan;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use streamsim_generator::MessageSynthesizer;
use streamsim_transport::DeliveryError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared per-worker counters, sampled by the stats reporter while the
/// worker is running.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    /// Messages acknowledged downstream.
    pub sent: AtomicU64,
    /// Messages in batches dropped after retry exhaustion.
    pub failed: AtomicU64,
    /// Delivery cycles that finished behind schedule.
    pub pressure: AtomicU64,
}

/// One generation worker: synthesizes batches, delivers them and paces
/// itself against its rate share.
pub struct Worker {
    plan: WorkerPlan,
    synthesizer: MessageSynthesizer,
    client: DeliveryClient,
    counters: Arc<WorkerCounters>,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        plan: WorkerPlan,
        synthesizer: MessageSynthesizer,
        client: DeliveryClient,
        counters: Arc<WorkerCounters>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            plan,
            synthesizer,
            client,
            counters,
            cancel,
        }
    }

    /// Run the generate/deliver/pace loop until cancellation.
    ///
    /// Pacing is closed-loop: after each batch the worker compares the ideal
    /// elapsed time for everything attempted so far against the wall clock
    /// and sleeps off the difference. Dropped batches still count as
    /// attempted, so a struggling endpoint does not push the offered rate
    /// above target. When the loop is already behind schedule it skips the
    /// sleep and bumps the pressure counter instead.
    pub async fn run(mut self) -> Result<(), DeliveryError> {
        let start = Instant::now();
        let mut attempted: u64 = 0;

        debug!(
            worker = self.plan.id,
            rate_share = self.plan.rate_share,
            batch_size = self.plan.batch_size,
            "worker started"
        );

        while !self.cancel.is_cancelled() {
            let payloads: Vec<String> = (0..self.plan.batch_size)
                .map(|_| self.synthesizer.generate().to_json())
                .collect();

            match self.client.deliver(&payloads).await? {
                BatchOutcome::Sent => {
                    self.counters
                        .sent
                        .fetch_add(payloads.len() as u64, Ordering::Relaxed);
                }
                BatchOutcome::Dropped => {
                    self.counters
                        .failed
                        .fetch_add(payloads.len() as u64, Ordering::Relaxed);
                }
            }
            attempted += payloads.len() as u64;

            let ideal = Duration::from_secs_f64(attempted as f64 / self.plan.rate_share as f64);
            let elapsed = start.elapsed();
            if let Some(pause) = ideal.checked_sub(elapsed) {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            } else {
                self.counters.pressure.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(worker = self.plan.id, attempted, "worker stopped");
        Ok(())
    }
}
