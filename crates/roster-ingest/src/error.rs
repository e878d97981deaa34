//! Source-level fetch errors
//!
//! A `FetchError` never aborts a run. It is captured in the outcome of the source that
//! produced it, and its classification decides whether the source is retried in the
//! next cycle or dropped.

use std::io::ErrorKind;
use thiserror::Error;

use crate::parser::EXPECTED_HEADER;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("malformed CSV: {0}")]
    Csv(String),

    #[error("empty CSV, expected header '{}'", EXPECTED_HEADER)]
    MissingHeader,

    #[error("invalid CSV header '{found}', expected '{}'", EXPECTED_HEADER)]
    InvalidHeader { found: String },

    #[error("unable to read file: {message}")]
    Io {
        kind: ErrorKind,
        message: String,
    },

    #[error("unable to load file (status code {0})")]
    HttpStatus(u16),

    #[error("server error (status code {0})")]
    ServerStatus(u16),

    #[error("request failed: {message}")]
    Transport { message: String, transient: bool },

    #[error("unknown url scheme: {0}")]
    UnknownScheme(String),
}

impl FetchError {
    /// Whether the source should be attempted again in a later cycle
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::ServerStatus(_) => true,
            FetchError::Io { kind, .. } => matches!(
                kind,
                ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
            ),
            FetchError::Transport { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Short label used in log lines and reports
    pub fn classification(&self) -> &'static str {
        if self.is_retryable() {
            "retryable error"
        } else {
            "non retryable error"
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for FetchError {
    fn from(err: csv::Error) -> Self {
        FetchError::Csv(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport {
            transient: err.is_timeout(),
            message: err.to_string(),
        }
    }
}
