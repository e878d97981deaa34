//! Local file sources

use async_trait::async_trait;
use roster_common::Locator;
use std::io::{Error, ErrorKind};
use tracing::debug;

use super::Fetcher;
use crate::error::FetchError;
use crate::parser::{parse_records, RecordBatch};

/// Reads `file` locators from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<RecordBatch, FetchError> {
        let path = locator.to_file_path().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a local file", locator),
            )
        })?;

        let data = tokio::fs::read(&path).await?;
        debug!(path = %path.display(), bytes = data.len(), "Read source file");

        parse_records(&data)
    }
}
