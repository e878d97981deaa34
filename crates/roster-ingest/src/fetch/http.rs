//! HTTP sources
//!
//! Status handling: 200 parses the body, any 5xx is a retryable server error, and
//! every other status is fatal.

use async_trait::async_trait;
use reqwest::StatusCode;
use roster_common::Locator;
use std::time::Duration;
use tracing::debug;

use super::Fetcher;
use crate::error::FetchError;
use crate::parser::{parse_records, RecordBatch};

/// Fetches `http`/`https` locators with a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<RecordBatch, FetchError> {
        let response = self.client.get(locator.url().clone()).send().await?;
        let status = response.status();

        debug!(source = %locator, status = status.as_u16(), "Received response");

        if status == StatusCode::OK {
            let body = response.bytes().await?;
            return parse_records(&body);
        }

        if status.is_server_error() {
            return Err(FetchError::ServerStatus(status.as_u16()));
        }

        Err(FetchError::HttpStatus(status.as_u16()))
    }
}
