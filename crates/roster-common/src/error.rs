//! Error types for Roster

use thiserror::Error;

/// Result type alias for Roster setup operations
pub type Result<T> = std::result::Result<T, RosterError>;

/// Main error type for Roster
///
/// Covers failures that stop a run before any source is fetched. Errors tied to a
/// single source never surface here; they are captured in that source's outcome.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Unable to read source index {path}: {source}")]
    Index {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
