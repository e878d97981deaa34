//! Source fetchers
//!
//! A fetcher turns one [`Locator`] into a parsed [`RecordBatch`] or a classified
//! [`FetchError`]. The worker pool only sees the [`Fetcher`] trait; the concrete
//! transport is picked per locator scheme by [`SchemeFetcher`].

pub mod file;
pub mod http;

use async_trait::async_trait;
use roster_common::types::{FILE_SCHEME, HTTPS_SCHEME, HTTP_SCHEME};
use roster_common::Locator;
use std::time::Duration;

use crate::error::FetchError;
use crate::parser::RecordBatch;

pub use file::FileFetcher;
pub use http::HttpFetcher;

/// Retrieves and parses one source
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the source behind `locator`.
    ///
    /// Implementations must not panic on bad input: every failure is returned as a
    /// [`FetchError`] so the caller can decide whether to retry.
    async fn fetch(&self, locator: &Locator) -> Result<RecordBatch, FetchError>;
}

/// Dispatches to the file or HTTP fetcher based on the locator scheme
pub struct SchemeFetcher {
    file: FileFetcher,
    http: HttpFetcher,
}

impl SchemeFetcher {
    pub fn new(file: FileFetcher, http: HttpFetcher) -> Self {
        Self { file, http }
    }

    /// Build both transports, the HTTP client using `http_timeout` per request
    pub fn with_timeout(http_timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::new(FileFetcher, HttpFetcher::with_timeout(http_timeout)?))
    }
}

#[async_trait]
impl Fetcher for SchemeFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<RecordBatch, FetchError> {
        match locator.scheme() {
            FILE_SCHEME => self.file.fetch(locator).await,
            HTTP_SCHEME | HTTPS_SCHEME => self.http.fetch(locator).await,
            other => Err(FetchError::UnknownScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_scheme_is_fatal() {
        let fetcher = SchemeFetcher::with_timeout(Duration::from_secs(1)).unwrap();
        let locator = Locator::parse("ftp://example.com/users.csv").unwrap();

        let err = fetcher.fetch(&locator).await.unwrap_err();

        assert_eq!(err, FetchError::UnknownScheme("ftp".into()));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_file_scheme_dispatches_to_file_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "fname, lname, age\nAda,Lovelace,36\n").unwrap();

        let fetcher = SchemeFetcher::with_timeout(Duration::from_secs(1)).unwrap();
        let batch = fetcher
            .fetch(&Locator::from_file_path(&path).unwrap())
            .await
            .unwrap();

        assert_eq!(batch.users.len(), 1);
    }
}
