//! Bounded worker pool
//!
//! One pool generation spawns exactly `pool_size` tokio tasks that drain a single shared
//! queue. Each worker fetches one source at a time, times it, and writes the outcome
//! into the [`ResultCollector`]. [`run_pool`] returns only after every worker has seen
//! the queue close and finished its last write.

use roster_common::Locator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::collector::ResultCollector;
use crate::fetch::Fetcher;
use crate::outcome::Outcome;

type Queue = Arc<Mutex<mpsc::Receiver<Locator>>>;

/// Queue capacity ceiling, independent of the worker count
const MAX_QUEUE_CAPACITY: usize = 1024;

/// Process every locator once with `pool_size` concurrent workers.
///
/// Returns the number of outcomes written. That is `locators.len()` unless `cancel`
/// fired mid-generation, in which case queued and in-flight sources are abandoned
/// without an outcome. A `pool_size` of 0 is treated as 1.
pub async fn run_pool(
    locators: &[Locator],
    fetcher: Arc<dyn Fetcher>,
    pool_size: usize,
    collector: &ResultCollector,
    cancel: &CancellationToken,
) -> usize {
    if locators.is_empty() {
        return 0;
    }

    let pool_size = pool_size.max(1);
    let (tx, rx) = mpsc::channel(pool_size.min(MAX_QUEUE_CAPACITY));
    let queue: Queue = Arc::new(Mutex::new(rx));

    let mut workers = JoinSet::new();
    for id in 0..pool_size {
        workers.spawn(worker(
            id,
            queue.clone(),
            fetcher.clone(),
            collector.clone(),
            cancel.clone(),
        ));
    }
    // Workers hold the only receivers, so sends fail once they have all stopped.
    drop(queue);

    for locator in locators {
        if tx.send(locator.clone()).await.is_err() {
            debug!("All workers stopped, abandoning remaining queue");
            break;
        }
    }
    drop(tx);

    let mut written = 0;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(count) => written += count,
            Err(e) => error!(error = %e, "Pool worker terminated abnormally"),
        }
    }

    written
}

async fn worker(
    id: usize,
    queue: Queue,
    fetcher: Arc<dyn Fetcher>,
    collector: ResultCollector,
    cancel: CancellationToken,
) -> usize {
    let mut written = 0;

    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = rx.recv() => item,
            }
        };

        let Some(source) = next else {
            break;
        };

        debug!(worker = id, source = %source, "Worker picked up source");

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(worker = id, source = %source, "Fetch abandoned on cancellation");
                break;
            },
            result = fetcher.fetch(&source) => result,
        };

        collector
            .upsert(Outcome::new(source, result, started.elapsed()))
            .await;
        written += 1;
    }

    written
}
