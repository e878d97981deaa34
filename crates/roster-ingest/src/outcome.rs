//! Per-source fetch outcomes

use roster_common::Locator;
use serde::Serialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::parser::{RecordBatch, User};

/// Result of one fetch attempt for one source.
///
/// A retried source gets a fresh outcome every cycle; the collector keeps only the
/// latest one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub source: Locator,
    #[serde(serialize_with = "serialize_result")]
    pub result: Result<RecordBatch, FetchError>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl Outcome {
    pub fn new(source: Locator, result: Result<RecordBatch, FetchError>, elapsed: Duration) -> Self {
        Self {
            source,
            result,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Failed, and eligible for another attempt
    pub fn is_retryable(&self) -> bool {
        self.error().is_some_and(FetchError::is_retryable)
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.result.as_ref().err()
    }

    /// Parsed users, empty for failed outcomes
    pub fn users(&self) -> &[User] {
        self.result.as_ref().map(|b| b.users.as_slice()).unwrap_or(&[])
    }

    pub fn skipped(&self) -> usize {
        self.result.as_ref().map(|b| b.skipped).unwrap_or(0)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(batch) => write!(
                f,
                "{} {} users ({} skipped) elapsed:{:?}",
                self.source,
                batch.users.len(),
                batch.skipped,
                self.elapsed
            ),
            Err(err) => write!(f, "{} - {} - {}", self.source, err.classification(), err),
        }
    }
}

fn serialize_result<S>(
    result: &Result<RecordBatch, FetchError>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(2))?;
    match result {
        Ok(batch) => {
            map.serialize_entry("users", &batch.users.len())?;
            map.serialize_entry("skipped", &batch.skipped)?;
        },
        Err(err) => {
            map.serialize_entry("error", &err.to_string())?;
            map.serialize_entry("retryable", &err.is_retryable())?;
        },
    }
    map.end()
}

fn serialize_millis<S>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(millis(*elapsed))
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn locator() -> Locator {
        Locator::parse("http://example.com/users.csv").unwrap()
    }

    #[test]
    fn test_success_display() {
        let batch = RecordBatch {
            users: vec![User::new("Ada", "Lovelace", 36).unwrap()],
            skipped: 2,
        };
        let outcome = Outcome::new(locator(), Ok(batch), Duration::from_millis(5));

        assert!(outcome.is_success());
        assert!(!outcome.is_retryable());
        assert_eq!(
            outcome.to_string(),
            "http://example.com/users.csv 1 users (2 skipped) elapsed:5ms"
        );
    }

    #[test]
    fn test_retryable_display() {
        let outcome = Outcome::new(
            locator(),
            Err(FetchError::ServerStatus(502)),
            Duration::ZERO,
        );

        assert!(outcome.is_retryable());
        assert!(outcome.users().is_empty());
        assert_eq!(
            outcome.to_string(),
            "http://example.com/users.csv - retryable error - server error (status code 502)"
        );
    }

    #[test]
    fn test_fatal_is_not_retryable() {
        let outcome = Outcome::new(locator(), Err(FetchError::HttpStatus(404)), Duration::ZERO);
        assert!(!outcome.is_success());
        assert!(!outcome.is_retryable());
        assert_eq!(outcome.skipped(), 0);
    }

    #[test]
    fn test_serializes_flat_summary() {
        let outcome = Outcome::new(locator(), Err(FetchError::HttpStatus(404)), Duration::from_millis(7));
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["source"], "http://example.com/users.csv");
        assert_eq!(json["result"]["retryable"], false);
        assert_eq!(json["elapsed_ms"], 7);
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
