//! Bounded worker pool for cache-populating jobs
//!
//! At most `workers` lookups are in flight. Finished lookups are handed, one
//! at a time, to a single [`PoolSink`] that owns the cache being built, so no
//! locking is needed. The sink checkpoints every `save_every` processed items
//! and once more at the end. Cancellation stops new work from starting;
//! in-flight lookups finish and are applied before the final checkpoint.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owner of the results of a pool run
pub trait PoolSink<T> {
    fn apply(&mut self, outcome: T);

    /// Persist progress; `processed` counts items applied so far
    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub queued: usize,
    pub processed: usize,
    pub checkpoints: usize,
    pub cancelled: bool,
}

pub async fn run_pool<I, T, F, Fut, S>(
    items: Vec<I>,
    workers: usize,
    save_every: usize,
    cancel: &CancellationToken,
    work: F,
    sink: &mut S,
) -> anyhow::Result<PoolStats>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
    S: PoolSink<T>,
{
    let workers = workers.max(1);
    let save_every = save_every.max(1);
    let mut stats = PoolStats {
        queued: items.len(),
        ..Default::default()
    };

    let mut queue = items.into_iter();
    let mut in_flight = FuturesUnordered::new();

    for _ in 0..workers {
        match queue.next() {
            Some(item) => in_flight.push(work(item)),
            None => break,
        }
    }

    while let Some(outcome) = in_flight.next().await {
        sink.apply(outcome);
        stats.processed += 1;

        if stats.processed % save_every == 0 {
            sink.checkpoint(stats.processed)?;
            stats.checkpoints += 1;
            debug!(processed = stats.processed, queued = stats.queued, "Checkpoint");
        }

        if cancel.is_cancelled() {
            if !stats.cancelled {
                info!(
                    processed = stats.processed,
                    in_flight = in_flight.len(),
                    "Cancellation requested, draining in-flight work"
                );
            }
            stats.cancelled = true;
            continue;
        }
        if let Some(item) = queue.next() {
            in_flight.push(work(item));
        }
    }

    sink.checkpoint(stats.processed)?;
    stats.checkpoints += 1;
    Ok(stats)
}
