//! Roster Ingest - concurrent CSV roster loader

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::logging::{init_logging, LogConfig, LogLevel};
use roster_ingest::config::{cycles_limit, IngestConfig, OutputFormat};
use roster_ingest::pipeline;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "roster-ingest")]
#[command(author, version, about = "Load CSV user rosters concurrently and summarize ages")]
struct Cli {
    /// Newline-delimited index of sources
    #[arg(short, long, env = "ROSTER_INDEX")]
    index: Option<PathBuf>,

    /// Directory that relative index entries resolve against
    #[arg(short, long, env = "ROSTER_DATA_ROOT")]
    data_root: Option<PathBuf>,

    /// Concurrent workers per pool generation
    #[arg(short, long, env = "ROSTER_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Maximum pool generations, 0 for unbounded
    #[arg(long, env = "ROSTER_MAX_CYCLES")]
    max_cycles: Option<u32>,

    /// Wall-clock budget for fetching, in seconds
    #[arg(long, env = "ROSTER_DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, env = "ROSTER_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, env = "ROSTER_OUTPUT")]
    output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, mut config: IngestConfig) -> IngestConfig {
        if let Some(index) = self.index {
            config.index_file = index;
        }
        if let Some(root) = self.data_root {
            config.data_root = root;
        }
        if let Some(size) = self.pool_size {
            config.pool_size = size;
        }
        if let Some(cycles) = self.max_cycles {
            config.max_cycles = cycles_limit(cycles);
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = self.http_timeout_secs {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("roster-ingest")
        .filter_directives("hyper=warn,reqwest=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = cli.apply(IngestConfig::from_env().context("Invalid configuration")?);
    config.validate().context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, abandoning remaining sources");
                cancel.cancel();
            }
        }
    });

    info!(
        index = %config.index_file.display(),
        pool_size = config.pool_size,
        max_cycles = ?config.max_cycles,
        "Starting ingest"
    );

    let report = pipeline::run(&config, cancel).await?;
    report.log();

    if config.output == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    info!("Ingest complete");
    Ok(())
}
