//! Ingest configuration

use roster_common::{Result, RosterError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

// ============================================================================
// Ingest Configuration Constants
// ============================================================================

/// Default newline-delimited index of sources.
pub const DEFAULT_INDEX_FILE: &str = "index.txt";

/// Default directory that relative index entries resolve against.
pub const DEFAULT_DATA_ROOT: &str = "data";

/// Default number of concurrent workers per pool generation.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Largest accepted pool size.
pub const MAX_POOL_SIZE: usize = 1024;

/// Default cap on pool generations. 0 means unbounded.
pub const DEFAULT_MAX_CYCLES: u32 = 10;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// How the final report is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Log lines only
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(RosterError::Config(format!("Invalid output format: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub index_file: PathBuf,
    pub data_root: PathBuf,
    pub pool_size: usize,
    /// `None` keeps cycling until no retryable source remains
    pub max_cycles: Option<u32>,
    pub deadline: Option<Duration>,
    pub http_timeout: Duration,
    pub output: OutputFormat,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            pool_size: DEFAULT_POOL_SIZE,
            max_cycles: Some(DEFAULT_MAX_CYCLES),
            deadline: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            output: OutputFormat::Text,
        }
    }
}

impl IngestConfig {
    /// Load configuration from `.env`, environment variables and defaults
    ///
    /// Environment variables:
    /// - `ROSTER_INDEX`: path of the source index
    /// - `ROSTER_DATA_ROOT`: directory relative index entries resolve against
    /// - `ROSTER_POOL_SIZE`: workers per pool generation
    /// - `ROSTER_MAX_CYCLES`: cap on pool generations (0 = unbounded)
    /// - `ROSTER_DEADLINE_SECS`: wall-clock budget for the whole fetch
    /// - `ROSTER_HTTP_TIMEOUT_SECS`: per-request HTTP timeout
    /// - `ROSTER_OUTPUT`: text or json
    pub fn load() -> Result<Self> {
        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`IngestConfig::load`] but leaves validation to the caller, so later
    /// overrides (CLI flags) can be applied first
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::default().merge_env()
    }

    fn merge_env(mut self) -> Result<Self> {
        if let Ok(index) = std::env::var("ROSTER_INDEX") {
            self.index_file = PathBuf::from(index);
        }

        if let Ok(root) = std::env::var("ROSTER_DATA_ROOT") {
            self.data_root = PathBuf::from(root);
        }

        if let Some(size) = parse_env::<usize>("ROSTER_POOL_SIZE")? {
            self.pool_size = size;
        }

        if let Some(cycles) = parse_env::<u32>("ROSTER_MAX_CYCLES")? {
            self.max_cycles = cycles_limit(cycles);
        }

        if let Some(secs) = parse_env::<u64>("ROSTER_DEADLINE_SECS")? {
            self.deadline = Some(Duration::from_secs(secs));
        }

        if let Some(secs) = parse_env::<u64>("ROSTER_HTTP_TIMEOUT_SECS")? {
            self.http_timeout = Duration::from_secs(secs);
        }

        if let Ok(output) = std::env::var("ROSTER_OUTPUT") {
            self.output = output.parse()?;
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(RosterError::Config(
                "Pool size must be greater than 0".to_string(),
            ));
        }

        if self.pool_size > MAX_POOL_SIZE {
            return Err(RosterError::Config(format!(
                "Pool size must be at most {}, got {}",
                MAX_POOL_SIZE, self.pool_size
            )));
        }

        if self.index_file.as_os_str().is_empty() {
            return Err(RosterError::Config("Index file path cannot be empty".to_string()));
        }

        if self.http_timeout.is_zero() {
            return Err(RosterError::Config(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_cycles.is_none() && self.deadline.is_none() {
            tracing::warn!("No cycle limit or deadline configured - a permanently failing source will retry forever");
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_cycles: self.max_cycles,
            deadline: self.deadline,
        }
    }
}

/// Map a cycle count setting to a limit, 0 meaning unbounded
pub fn cycles_limit(cycles: u32) -> Option<u32> {
    (cycles > 0).then_some(cycles)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RosterError::Config(format!("Invalid value for {}: {}", key, value))),
        Err(_) => Ok(None),
    }
}
