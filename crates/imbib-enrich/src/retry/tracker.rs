//! Failed enrichment request tracking
//!
//! Records which publications failed to enrich and how often, so callers can
//! decide what to retry later. Independent of the retry executor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::identifiers::IdentifierMap;
use crate::error::EnrichmentError;

/// One tracked failure per publication
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRequestRecord {
    pub publication_id: String,
    pub identifiers: IdentifierMap,
    /// Most recent failure
    pub last_error: EnrichmentError,
    /// Number of repeated failures after the first (0-based)
    pub retry_count: u32,
    /// When the publication first failed
    pub first_failed_at: DateTime<Utc>,
}

/// Tracks enrichment failures per publication
#[derive(Default)]
pub struct FailedRequestTracker {
    records: Mutex<HashMap<String, FailedRequestRecord>>,
}

impl FailedRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    ///
    /// The first failure for a publication creates a record; later failures
    /// increment `retry_count` and replace `last_error`, preserving
    /// `first_failed_at`.
    pub async fn record_failure(
        &self,
        publication_id: impl Into<String>,
        identifiers: IdentifierMap,
        error: EnrichmentError,
    ) {
        let publication_id = publication_id.into();
        let mut records = self.records.lock().await;
        match records.get_mut(&publication_id) {
            Some(record) => {
                record.retry_count += 1;
                record.last_error = error;
                record.identifiers = identifiers;
            }
            None => {
                tracing::debug!(publication_id = %publication_id, error = %error, "tracking enrichment failure");
                records.insert(
                    publication_id.clone(),
                    FailedRequestRecord {
                        publication_id,
                        identifiers,
                        last_error: error,
                        retry_count: 0,
                        first_failed_at: Utc::now(),
                    },
                );
            }
        }
    }

    /// Forget a publication's failure record
    pub async fn clear_failure(&self, publication_id: &str) {
        self.records.lock().await.remove(publication_id);
    }

    /// Forget everything
    pub async fn clear_all(&self) {
        self.records.lock().await.clear();
    }

    /// Number of publications currently tracked
    pub async fn failure_count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// All currently tracked records
    pub async fn requests_for_retry(&self) -> Vec<FailedRequestRecord> {
        self.records.lock().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_repeated_failures_increment_retry_count() {
        let tracker = FailedRequestTracker::new();
        for _ in 0..3 {
            tracker
                .record_failure(
                    "pub-1",
                    IdentifierMap::new(),
                    EnrichmentError::NetworkError("down".into()),
                )
                .await;
        }

        let records = tracker.requests_for_retry().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].retry_count, 2);
    }

    #[tokio::test]
    async fn test_first_failed_at_preserved() {
        let tracker = FailedRequestTracker::new();
        tracker
            .record_failure("pub-1", IdentifierMap::new(), EnrichmentError::NotFound)
            .await;
        let first = tracker.requests_for_retry().await[0].first_failed_at;

        tracker
            .record_failure(
                "pub-1",
                IdentifierMap::new(),
                EnrichmentError::NetworkError("down".into()),
            )
            .await;
        let record = &tracker.requests_for_retry().await[0];
        assert_eq!(record.first_failed_at, first);
        assert_eq!(
            record.last_error,
            EnrichmentError::NetworkError("down".into())
        );
    }

    #[tokio::test]
    async fn test_clear_failure() {
        let tracker = FailedRequestTracker::new();
        tracker
            .record_failure("pub-1", IdentifierMap::new(), EnrichmentError::NotFound)
            .await;
        tracker
            .record_failure("pub-2", IdentifierMap::new(), EnrichmentError::NotFound)
            .await;
        assert_eq!(tracker.failure_count().await, 2);

        tracker.clear_failure("pub-1").await;
        assert_eq!(tracker.failure_count().await, 1);

        tracker.clear_all().await;
        assert_eq!(tracker.failure_count().await, 0);
    }
}
