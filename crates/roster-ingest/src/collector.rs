//! Thread-safe outcome collection shared by pool workers

use roster_common::Locator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::outcome::Outcome;

/// Latest outcome per source, written concurrently by workers.
///
/// Keyed by source identity: a later write for the same source replaces the earlier
/// one, so a retried source is only ever represented by its most recent attempt. The
/// lock is held for a single map write and never across I/O.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    outcomes: Arc<Mutex<HashMap<Locator, Outcome>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the outcome for its source
    pub async fn upsert(&self, outcome: Outcome) {
        let mut outcomes = self.outcomes.lock().await;
        outcomes.insert(outcome.source.clone(), outcome);
    }

    /// Copy of every stored outcome, in unspecified order
    pub async fn snapshot(&self) -> Vec<Outcome> {
        self.outcomes.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.outcomes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outcomes.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::parser::RecordBatch;
    use std::time::Duration;

    fn locator(name: &str) -> Locator {
        Locator::parse(&format!("http://example.com/{}.csv", name)).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_outcome() {
        let collector = ResultCollector::new();
        let source = locator("a");

        collector
            .upsert(Outcome::new(source.clone(), Err(FetchError::ServerStatus(503)), Duration::ZERO))
            .await;
        collector
            .upsert(Outcome::new(source.clone(), Ok(RecordBatch::default()), Duration::ZERO))
            .await;

        let snapshot = collector.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].is_success());
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let collector = ResultCollector::new();
        assert!(collector.is_empty().await);

        let mut handles = Vec::new();
        for i in 0..32 {
            let collector = collector.clone();
            handles.push(tokio::spawn(async move {
                let source = locator(&(i % 8).to_string());
                collector
                    .upsert(Outcome::new(source, Ok(RecordBatch::default()), Duration::ZERO))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(collector.len().await, 8);
    }
}
