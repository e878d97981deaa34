//! Retry cycling over pool generations
//!
//! The cycler runs one pool generation over the full source list, then keeps starting
//! fresh generations seeded with only the sources whose latest outcome is a retryable
//! failure. Generations never overlap. Outcomes accumulate in one collector for the
//! whole run, so each source ends up represented by its latest attempt.

use roster_common::Locator;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::collector::ResultCollector;
use crate::fetch::Fetcher;
use crate::outcome::{millis, Outcome};
use crate::pool::run_pool;

/// Bounds on the retry loop.
///
/// The default is unbounded: cycling stops only when no retryable source remains, so
/// a source that fails retryably forever keeps the loop alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of pool generations, including the first
    pub max_cycles: Option<u32>,
    /// Wall-clock budget for the whole run; in-flight fetches are abandoned when it expires
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Why the retry loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No retryable sources remained
    Drained,
    /// `max_cycles` generations ran and retryable sources remained
    CycleLimit,
    /// The deadline expired or the caller cancelled the run
    Cancelled,
}

/// Final partition of a multi-cycle fetch
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub succeeded: Vec<Outcome>,
    /// Failed with a non-retryable error; never retried
    pub fatal: Vec<Outcome>,
    /// Still retryable when the loop stopped on a cycle limit or cancellation
    pub exhausted: Vec<Outcome>,
    /// Never produced an outcome because the run was cancelled first
    pub unattempted: Vec<Locator>,
    pub cycles: u32,
    pub elapsed: Duration,
    pub termination: Termination,
}

impl FetchReport {
    /// Every stored outcome, one per source
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.succeeded
            .iter()
            .chain(self.fatal.iter())
            .chain(self.exhausted.iter())
    }
}

#[derive(Default)]
struct Partition {
    succeeded: Vec<Outcome>,
    retryable: Vec<Outcome>,
    fatal: Vec<Outcome>,
}

impl Partition {
    fn of(mut outcomes: Vec<Outcome>) -> Self {
        outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        let mut partition = Self::default();
        for outcome in outcomes {
            if outcome.is_success() {
                partition.succeeded.push(outcome);
            } else if outcome.is_retryable() {
                partition.retryable.push(outcome);
            } else {
                partition.fatal.push(outcome);
            }
        }
        partition
    }

    fn retryable_sources(&self) -> Vec<Locator> {
        self.retryable.iter().map(|o| o.source.clone()).collect()
    }
}

/// Drives pool generations until no retryable work is left
pub struct RetryCycler {
    fetcher: Arc<dyn Fetcher>,
    pool_size: usize,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryCycler {
    pub fn new(fetcher: Arc<dyn Fetcher>, pool_size: usize) -> Self {
        Self {
            fetcher,
            pool_size,
            policy: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop the run early when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every source, retrying retryable failures according to the policy
    pub async fn run(&self, locators: &[Locator]) -> FetchReport {
        let started = Instant::now();
        let collector = ResultCollector::new();

        let cancel = self.cancel.child_token();
        let deadline_timer = self.policy.deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!(deadline_ms = millis(deadline), "Fetch deadline expired");
                cancel.cancel();
            })
        });

        let mut remaining = locators.to_vec();
        let mut cycles = 0u32;

        let (termination, partition) = loop {
            if cancel.is_cancelled() {
                break (Termination::Cancelled, Partition::of(collector.snapshot().await));
            }

            cycles += 1;
            info!(
                cycle = cycles,
                sources = remaining.len(),
                pool_size = self.pool_size,
                "Starting pool generation"
            );

            run_pool(&remaining, self.fetcher.clone(), self.pool_size, &collector, &cancel).await;

            let partition = Partition::of(collector.snapshot().await);
            remaining = partition.retryable_sources();

            if cancel.is_cancelled() {
                break (Termination::Cancelled, partition);
            }
            if remaining.is_empty() {
                break (Termination::Drained, partition);
            }
            if self.policy.max_cycles.is_some_and(|max| cycles >= max) {
                break (Termination::CycleLimit, partition);
            }

            info!(
                cycle = cycles,
                remaining = remaining.len(),
                "Retryable sources left - cycling again"
            );
        };

        if let Some(timer) = deadline_timer {
            timer.abort();
        }

        let attempted: HashSet<&Locator> = partition
            .succeeded
            .iter()
            .chain(&partition.retryable)
            .chain(&partition.fatal)
            .map(|o| &o.source)
            .collect();
        let mut seen = HashSet::new();
        let unattempted: Vec<Locator> = locators
            .iter()
            .filter(|l| !attempted.contains(l) && seen.insert(*l))
            .cloned()
            .collect();

        for outcome in &partition.fatal {
            if let Some(err) = outcome.error() {
                warn!(source = %outcome.source, error = %err, "Skipping source");
            }
        }
        for outcome in &partition.retryable {
            warn!(source = %outcome.source, ?termination, "Giving up on retryable source");
        }
        for source in &unattempted {
            warn!(source = %source, "Source was never attempted");
        }

        FetchReport {
            succeeded: partition.succeeded,
            fatal: partition.fatal,
            exhausted: partition.retryable,
            unattempted,
            cycles,
            elapsed: started.elapsed(),
            termination,
        }
    }
}

/// Fetch every source with an unbounded retry loop
pub async fn fetch(locators: &[Locator], fetcher: Arc<dyn Fetcher>, pool_size: usize) -> FetchReport {
    RetryCycler::new(fetcher, pool_size).run(locators).await
}
