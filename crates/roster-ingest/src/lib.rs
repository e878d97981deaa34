//! Roster Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads user rosters from many CSV sources concurrently, retries sources that fail
//! with transient errors, and summarizes the ages of every user loaded.
//!
//! # Pipeline
//!
//! - [`index`]: newline-delimited index into an ordered list of locators
//! - [`fetch`]: file and HTTP transports behind the [`fetch::Fetcher`] trait
//! - [`pool`]: bounded worker pool draining one shared queue
//! - [`retry`]: re-runs the pool over retryable failures until none remain
//! - [`aggregate`]: merge successful sources and compute mean and median age
//!
//! # Example
//!
//! ```no_run
//! use roster_ingest::config::IngestConfig;
//! use roster_ingest::pipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let report = pipeline::run(&config, CancellationToken::new()).await?;
//!     report.log();
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod outcome;
pub mod parser;
pub mod pipeline;
pub mod pool;
pub mod retry;

pub use error::FetchError;
pub use outcome::Outcome;
pub use parser::{RecordBatch, User};
pub use retry::{fetch, FetchReport, RetryCycler, RetryPolicy, Termination};
