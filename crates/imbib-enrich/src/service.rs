//! Enrichment orchestration
//!
//! Given identifiers, the service resolves them, selects a source plugin per
//! the configured preference order, invokes it (optionally through the retry
//! executor), merges results into existing data, and owns the request queue.
//!
//! The service never falls back to a secondary source on failure, rate
//! limiting included. Callers wanting multi-source fallback call `enrich_now`
//! again against another of `plugins_supporting`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::enrichment::{
    EnrichmentCapability, EnrichmentData, EnrichmentPriority, EnrichmentRequest, EnrichmentResult,
};
use crate::domain::identifiers::{IdentifierMap, SourceId};
use crate::domain::search_result::SearchResult;
use crate::error::{EnrichmentError, Result};
use crate::identifiers::IdentifierResolver;
use crate::queue::EnrichmentQueue;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::settings::SettingsProvider;
use crate::sources::EnrichmentSourcePlugin;

pub struct EnrichmentService {
    plugins: Vec<Arc<dyn EnrichmentSourcePlugin>>,
    resolver: IdentifierResolver,
    queue: EnrichmentQueue,
    settings: Arc<dyn SettingsProvider>,
    background_sync_running: AtomicBool,
}

impl EnrichmentService {
    pub fn new(
        plugins: Vec<Arc<dyn EnrichmentSourcePlugin>>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            plugins,
            resolver: IdentifierResolver::new(),
            queue: EnrichmentQueue::new(),
            settings,
            background_sync_running: AtomicBool::new(false),
        }
    }

    /// Like `new`, with an explicit queue capacity
    pub fn with_queue_capacity(
        plugins: Vec<Arc<dyn EnrichmentSourcePlugin>>,
        settings: Arc<dyn SettingsProvider>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            queue: EnrichmentQueue::with_max_size(queue_capacity),
            ..Self::new(plugins, settings)
        }
    }

    /// Enrich a publication right now.
    ///
    /// Resolves identifiers, selects the first configured source that accepts
    /// them, invokes it once, and merges the result over `existing` (new
    /// non-empty fields win). Plugin errors propagate untranslated.
    pub async fn enrich_now(
        &self,
        identifiers: &IdentifierMap,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentResult> {
        if identifiers.is_empty() {
            return Err(EnrichmentError::NoIdentifier);
        }

        let resolved = self.resolver.resolve(identifiers).await;
        let plugin = self.select_plugin(&resolved)?;

        tracing::debug!(source = plugin.metadata().id.as_str(), "enriching");
        let result = plugin.enrich(&resolved, existing).await?;
        Ok(Self::merge_result(result, existing))
    }

    /// Like `enrich_now`, with the plugin invocation driven by a retry
    /// executor built from `policy`. Exhausted retries surface the last error.
    pub async fn enrich_with_retry(
        &self,
        identifiers: &IdentifierMap,
        policy: RetryPolicy,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentResult> {
        if identifiers.is_empty() {
            return Err(EnrichmentError::NoIdentifier);
        }

        let resolved = self.resolver.resolve(identifiers).await;
        let plugin = self.select_plugin(&resolved)?;

        let executor = RetryExecutor::new(policy);
        let outcome = executor
            .execute(|| {
                let plugin = Arc::clone(&plugin);
                let resolved = resolved.clone();
                let existing = existing.cloned();
                async move { plugin.enrich(&resolved, existing.as_ref()).await }
            })
            .await;

        outcome
            .into_result()
            .map(|result| Self::merge_result(result, existing))
    }

    /// Enrich from a search result's own identifier fields
    pub async fn enrich_search_result(&self, result: &SearchResult) -> Result<EnrichmentResult> {
        self.enrich_now(&result.identifier_map(), None).await
    }

    /// Queue a publication for later enrichment; returns whether it was added
    pub async fn queue_for_enrichment(
        &self,
        publication_id: impl Into<String>,
        identifiers: IdentifierMap,
        priority: EnrichmentPriority,
    ) -> bool {
        self.queue
            .enqueue(EnrichmentRequest::new(publication_id, identifiers, priority))
            .await
    }

    /// Dequeue one request and enrich it.
    ///
    /// The dequeued entry is removed regardless of outcome; tracking failures
    /// for re-queueing is the caller's job (see `FailedRequestTracker`).
    pub async fn process_next_queued(
        &self,
    ) -> Option<(String, Result<EnrichmentResult>)> {
        let request = self.queue.dequeue().await?;
        let outcome = self.enrich_now(&request.identifiers, None).await;
        if let Err(ref error) = outcome {
            tracing::warn!(
                publication_id = %request.publication_id,
                error = %error,
                "queued enrichment failed"
            );
        }
        Some((request.publication_id, outcome))
    }

    /// Mark background sync running. Idempotent: a second start is a no-op.
    pub fn start_background_sync(&self) {
        if !self.background_sync_running.swap(true, Ordering::SeqCst) {
            tracing::info!("background sync started");
        }
    }

    /// Mark background sync stopped. Idempotent: stopping while not running
    /// is a no-op.
    pub fn stop_background_sync(&self) {
        if self.background_sync_running.swap(false, Ordering::SeqCst) {
            tracing::info!("background sync stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.background_sync_running.load(Ordering::SeqCst)
    }

    pub async fn queue_depth(&self) -> usize {
        self.queue.count().await
    }

    /// Access to the request queue for priority upgrades and inspection
    pub fn queue(&self) -> &EnrichmentQueue {
        &self.queue
    }

    pub fn registered_plugins(&self) -> &[Arc<dyn EnrichmentSourcePlugin>] {
        &self.plugins
    }

    /// The plugin registered for a source ID, if any
    pub fn plugin(&self, source: SourceId) -> Option<Arc<dyn EnrichmentSourcePlugin>> {
        self.plugins
            .iter()
            .find(|p| p.metadata().id == source)
            .cloned()
    }

    /// All plugins that can supply the given capability
    pub fn plugins_supporting(
        &self,
        capability: EnrichmentCapability,
    ) -> Vec<Arc<dyn EnrichmentSourcePlugin>> {
        self.plugins
            .iter()
            .filter(|p| p.supports(capability))
            .cloned()
            .collect()
    }

    /// First source in the configured order whose plugin accepts the
    /// identifiers. Never falls through to a later source at call time.
    fn select_plugin(
        &self,
        resolved: &IdentifierMap,
    ) -> Result<Arc<dyn EnrichmentSourcePlugin>> {
        let settings = self.settings.settings();
        let mut order = vec![settings.preferred_source];
        for source in settings.source_priority {
            if !order.contains(&source) {
                order.push(source);
            }
        }

        for source in order {
            if let Some(plugin) = self.plugin(source) {
                if plugin.can_enrich(resolved) {
                    return Ok(plugin);
                }
            }
        }
        Err(EnrichmentError::NoSourceAvailable)
    }

    fn merge_result(
        result: EnrichmentResult,
        existing: Option<&EnrichmentData>,
    ) -> EnrichmentResult {
        match existing {
            Some(old) => EnrichmentResult {
                data: old.merged_with(&result.data),
                resolved_identifiers: result.resolved_identifiers,
            },
            None => result,
        }
    }
}
