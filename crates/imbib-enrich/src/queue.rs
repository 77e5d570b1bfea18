//! Priority queue of pending enrichment requests
//!
//! Deduplicated by publication identity, bounded in size. Ordering is by
//! priority first (most urgent first) and FIFO within a priority. All
//! operations serialize on an internal lock, so readers never observe a
//! partially applied mutation.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::enrichment::{EnrichmentPriority, EnrichmentRequest};

/// Default capacity bound
pub const DEFAULT_MAX_SIZE: usize = 500;

struct QueueEntry {
    /// Monotonic insertion sequence; breaks ties within a priority
    seq: u64,
    request: EnrichmentRequest,
}

#[derive(Default)]
struct QueueInner {
    next_seq: u64,
    entries: Vec<QueueEntry>,
}

impl QueueInner {
    fn position_of(&self, publication_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.request.publication_id == publication_id)
    }

    fn enqueue(&mut self, request: EnrichmentRequest, max_size: usize) -> bool {
        if self.position_of(&request.publication_id).is_some() {
            return false;
        }
        if self.entries.len() >= max_size {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(QueueEntry { seq, request });
        true
    }

    fn best_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| (e.request.priority, e.seq))
            .map(|(idx, _)| idx)
    }

    fn dequeue(&mut self) -> Option<EnrichmentRequest> {
        let idx = self.best_index()?;
        Some(self.entries.remove(idx).request)
    }
}

/// Bounded, deduplicating priority queue for enrichment requests
pub struct EnrichmentQueue {
    max_size: usize,
    inner: Mutex<QueueInner>,
}

impl EnrichmentQueue {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Insert a request. Rejects duplicates (by publication ID) and inserts
    /// beyond capacity; returns whether the request was added.
    pub async fn enqueue(&self, request: EnrichmentRequest) -> bool {
        self.inner.lock().await.enqueue(request, self.max_size)
    }

    /// Insert a batch in input order; returns how many were added. The first
    /// occurrence of a publication ID wins.
    pub async fn enqueue_batch(&self, requests: Vec<EnrichmentRequest>) -> usize {
        let mut inner = self.inner.lock().await;
        let mut added = 0;
        for request in requests {
            if inner.enqueue(request, self.max_size) {
                added += 1;
            }
        }
        added
    }

    /// Remove and return the most urgent, earliest-enqueued request
    pub async fn dequeue(&self) -> Option<EnrichmentRequest> {
        self.inner.lock().await.dequeue()
    }

    /// Remove up to `count` requests in priority order
    pub async fn dequeue_up_to(&self, count: usize) -> Vec<EnrichmentRequest> {
        let mut inner = self.inner.lock().await;
        let mut drained = Vec::new();
        while drained.len() < count {
            match inner.dequeue() {
                Some(request) => drained.push(request),
                None => break,
            }
        }
        drained
    }

    /// The request `dequeue` would return, without removing it
    pub async fn peek(&self) -> Option<EnrichmentRequest> {
        let inner = self.inner.lock().await;
        inner.best_index().map(|idx| inner.entries[idx].request.clone())
    }

    pub async fn contains(&self, publication_id: &str) -> bool {
        self.inner.lock().await.position_of(publication_id).is_some()
    }

    /// Remove the entry for a publication; true iff one was present
    pub async fn remove(&self, publication_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.position_of(publication_id) {
            Some(idx) => {
                inner.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Raise a queued request's urgency. Succeeds only when `to` is strictly
    /// more urgent than the current priority; never downgrades.
    pub async fn upgrade_priority(&self, publication_id: &str, to: EnrichmentPriority) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.position_of(publication_id) {
            Some(idx) if to < inner.entries[idx].request.priority => {
                inner.entries[idx].request.priority = to;
                true
            }
            _ => false,
        }
    }

    pub async fn clear(&self) {
        self.inner.lock().await.entries.clear();
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    pub async fn is_full(&self) -> bool {
        self.inner.lock().await.entries.len() >= self.max_size
    }

    /// Per-priority tally, zero-filled for priorities with no entries
    pub async fn counts_by_priority(&self) -> HashMap<EnrichmentPriority, usize> {
        let inner = self.inner.lock().await;
        let mut counts: HashMap<EnrichmentPriority, usize> = EnrichmentPriority::all()
            .iter()
            .map(|p| (*p, 0))
            .collect();
        for entry in &inner.entries {
            *counts.entry(entry.request.priority).or_insert(0) += 1;
        }
        counts
    }

    /// Publication IDs of all queued requests
    pub async fn all_publication_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .entries
            .iter()
            .map(|e| e.request.publication_id.clone())
            .collect()
    }
}

impl Default for EnrichmentQueue {
    fn default() -> Self {
        Self::new()
    }
}
