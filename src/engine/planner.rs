//! Run planning: worker pool sizing, rate shares and batch sizes.
//!
//! The plan is computed once before any worker starts and stays fixed for
//! the whole run. Pacing adapts to measured throughput at runtime; the plan
//! itself does not.

use crate::config::SimulatorConfig;

/// Immutable per-worker assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPlan {
    /// Zero-based worker index, also the seed offset.
    pub id: usize,
    /// This worker's slice of the global rate, in messages/second.
    pub rate_share: u64,
    /// Messages per delivery cycle.
    pub batch_size: usize,
}

/// Compute the worker pool size for a target rate.
///
/// One worker per 1000 msg/sec of target rate, at least one, capped at
/// `max_workers`.
pub fn worker_count(target_rate: u64, max_workers: usize) -> usize {
    let by_rate = (target_rate / 1000).max(1) as usize;
    by_rate.min(max_workers)
}

/// Split the target rate into per-worker shares and size each worker's batch.
///
/// Shares sum to exactly `target_rate`: integer division distributes the
/// base share and the remainder goes to the lowest-indexed workers, one
/// extra message/second each. Batch size scales linearly with the share
/// (`batch_size_per_1k_rate` messages per 1000 msg/sec, rounded) and is
/// clamped to the configured bounds.
pub fn plan_workers(sim: &SimulatorConfig) -> Vec<WorkerPlan> {
    let workers = worker_count(sim.target_rate, sim.max_workers);
    let base = sim.target_rate / workers as u64;
    let remainder = (sim.target_rate % workers as u64) as usize;

    (0..workers)
        .map(|id| {
            let rate_share = if id < remainder { base + 1 } else { base };
            WorkerPlan {
                id,
                rate_share,
                batch_size: batch_size_for(rate_share, sim),
            }
        })
        .collect()
}

fn batch_size_for(rate_share: u64, sim: &SimulatorConfig) -> usize {
    let scaled = (rate_share as f64 / 1000.0 * sim.batch_size_per_1k_rate as f64).round() as usize;
    scaled.clamp(sim.min_batch_size, sim.max_batch_size)
}
