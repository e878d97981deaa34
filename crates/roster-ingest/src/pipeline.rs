//! End-to-end ingest run: index, fetch with retries, merge, summarize

use anyhow::{Context, Result};
use roster_common::Locator;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregate::{merge, summarize, Summary};
use crate::config::IngestConfig;
use crate::fetch::{Fetcher, SchemeFetcher};
use crate::index::load_index;
use crate::outcome::{millis, Outcome};
use crate::retry::{FetchReport, RetryCycler, Termination};

/// Everything a run produced, ready to log or serialize
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub sources: Vec<Outcome>,
    pub unattempted: Vec<Locator>,
    pub summary: Summary,
    pub cycles: u32,
    pub pool_size: usize,
    pub elapsed_ms: u64,
    pub termination: Termination,
}

impl RunReport {
    fn new(report: FetchReport, pool_size: usize) -> Self {
        let users = merge(&report.succeeded);
        let summary = summarize(&users);

        Self {
            sources: report.outcomes().cloned().collect(),
            unattempted: report.unattempted,
            summary,
            cycles: report.cycles,
            pool_size,
            elapsed_ms: millis(report.elapsed),
            termination: report.termination,
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &Outcome> {
        self.sources.iter().filter(|o| o.is_success())
    }

    /// Emit per-source lines followed by the summary
    pub fn log(&self) {
        info!(
            sources = self.succeeded().count(),
            elapsed_ms = self.elapsed_ms,
            pool_size = self.pool_size,
            cycles = self.cycles,
            "{} files read in {}ms (poolsize {})",
            self.succeeded().count(),
            self.elapsed_ms,
            self.pool_size
        );

        for outcome in &self.sources {
            if outcome.is_success() {
                info!("{}", outcome);
            } else {
                warn!("{}", outcome);
            }
        }

        self.summary.log();
    }
}

/// Run a full ingest using the configured index and the scheme-dispatching fetcher
pub async fn run(config: &IngestConfig, cancel: CancellationToken) -> Result<RunReport> {
    let locators = load_index(&config.index_file, &config.data_root)
        .await
        .context("Failed to load source index")?;

    let fetcher = SchemeFetcher::with_timeout(config.http_timeout)
        .context("Failed to build HTTP client")?;

    Ok(run_sources(&locators, Arc::new(fetcher), config, cancel).await)
}

/// Fetch, merge and summarize an explicit source list with any fetcher
pub async fn run_sources(
    locators: &[Locator],
    fetcher: Arc<dyn Fetcher>,
    config: &IngestConfig,
    cancel: CancellationToken,
) -> RunReport {
    let report = RetryCycler::new(fetcher, config.pool_size)
        .with_policy(config.retry_policy())
        .with_cancellation(cancel)
        .run(locators)
        .await;

    RunReport::new(report, config.pool_size)
}
