//! Background enrichment scheduler
//!
//! Polls the host application's publications on a timer, computes staleness,
//! and feeds stale candidates into the enrichment queue at background
//! priority. The periodic loop is a single spawned task cancelled through a
//! `CancellationToken`; start and stop are idempotent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::enrichment::EnrichmentPriority;
use crate::domain::identifiers::IdentifierMap;
use crate::service::EnrichmentService;
use crate::settings::SettingsProvider;

/// Default period between scheduler cycles
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default cap on publications queued per cycle
pub const DEFAULT_ITEMS_PER_CYCLE: usize = 25;

/// A candidate publication as reported by the host application
#[derive(Debug, Clone)]
pub struct StalePublication {
    pub publication_id: String,
    pub identifiers: IdentifierMap,
    /// When the publication was last enriched; None = never
    pub last_enriched: Option<DateTime<Utc>>,
}

/// Supplies the current candidate set, consulted once per cycle
pub trait StalePublicationProvider: Send + Sync {
    fn publications(&self) -> Vec<StalePublication>;
}

/// Scheduler counters and timing, as reported to the UI
#[derive(Debug, Clone)]
pub struct SchedulerStatistics {
    pub is_running: bool,
    pub last_check: Option<DateTime<Utc>>,
    /// Cumulative count of publications queued
    pub total_items_queued: u64,
    /// Cumulative count of completed cycles
    pub cycle_count: u64,
    /// Time remaining until the next periodic cycle; None when not running
    pub time_until_next_check: Option<Duration>,
}

/// Breakdown of how much enrichment work the library currently needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentNeeds {
    /// Publications that were never enriched
    pub never_enriched: usize,
    /// Publications enriched longer ago than the refresh interval
    pub stale: usize,
    pub total: usize,
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    last_check: Option<DateTime<Utc>>,
    total_items_queued: u64,
    cycle_count: u64,
    next_check_at: Option<Instant>,
}

struct SchedulerInner {
    service: Arc<EnrichmentService>,
    publications: Arc<dyn StalePublicationProvider>,
    settings: Arc<dyn SettingsProvider>,
    check_interval: Duration,
    items_per_cycle: usize,
    state: Mutex<SchedulerState>,
}

impl SchedulerInner {
    /// One scheduler cycle: skip entirely when auto-sync is off, otherwise
    /// queue up to `items_per_cycle` stale publications and update statistics.
    async fn run_cycle(&self) -> usize {
        let settings = self.settings.settings();
        if !settings.auto_sync_enabled {
            tracing::debug!("auto-sync disabled, skipping cycle");
            return 0;
        }

        let refresh_interval_days = settings.refresh_interval_days;
        let candidates: Vec<StalePublication> = self
            .publications
            .publications()
            .into_iter()
            .filter(|p| is_stale(p.last_enriched, refresh_interval_days))
            .take(self.items_per_cycle)
            .collect();

        let mut queued = 0u64;
        for candidate in candidates {
            if self
                .service
                .queue_for_enrichment(
                    candidate.publication_id,
                    candidate.identifiers,
                    EnrichmentPriority::BackgroundSync,
                )
                .await
            {
                queued += 1;
            }
        }

        let mut state = self.state.lock().await;
        state.last_check = Some(Utc::now());
        state.total_items_queued += queued;
        state.cycle_count += 1;
        tracing::info!(queued, cycle = state.cycle_count, "background sync cycle complete");

        queued as usize
    }
}

/// Periodically feeds stale publications into the enrichment service
#[derive(Clone)]
pub struct BackgroundScheduler {
    inner: Arc<SchedulerInner>,
}

impl BackgroundScheduler {
    pub fn new(
        service: Arc<EnrichmentService>,
        publications: Arc<dyn StalePublicationProvider>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self::with_config(
            service,
            publications,
            settings,
            DEFAULT_CHECK_INTERVAL,
            DEFAULT_ITEMS_PER_CYCLE,
        )
    }

    pub fn with_config(
        service: Arc<EnrichmentService>,
        publications: Arc<dyn StalePublicationProvider>,
        settings: Arc<dyn SettingsProvider>,
        check_interval: Duration,
        items_per_cycle: usize,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                service,
                publications,
                settings,
                check_interval,
                items_per_cycle,
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Launch the periodic loop. Starting while already running is a no-op;
    /// a second competing loop is never spawned.
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        if state.running {
            return;
        }

        let token = CancellationToken::new();
        state.running = true;
        state.cancel = Some(token.clone());
        state.next_check_at = Some(Instant::now() + self.inner.check_interval);

        let inner = Arc::clone(&self.inner);
        state.task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(inner.check_interval) => {}
                }
                inner.run_cycle().await;
                let mut state = inner.state.lock().await;
                state.next_check_at = Some(Instant::now() + inner.check_interval);
            }
        }));

        tracing::info!(
            interval_secs = self.inner.check_interval.as_secs(),
            "background scheduler started"
        );
    }

    /// Cancel the periodic loop. Stopping while not running is harmless.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.running {
            return;
        }
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.task.take();
        state.running = false;
        state.next_check_at = None;
        tracing::info!("background scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.running
    }

    /// Run one cycle immediately, outside the periodic cadence
    pub async fn trigger_immediate_check(&self) -> usize {
        self.inner.run_cycle().await
    }

    pub async fn statistics(&self) -> SchedulerStatistics {
        let state = self.inner.state.lock().await;
        SchedulerStatistics {
            is_running: state.running,
            last_check: state.last_check,
            total_items_queued: state.total_items_queued,
            cycle_count: state.cycle_count,
            time_until_next_check: state
                .next_check_at
                .map(|at| at.saturating_duration_since(Instant::now())),
        }
    }

    /// Staleness breakdown over the full candidate set, not capped by
    /// `items_per_cycle`
    pub fn enrichment_needs(&self) -> EnrichmentNeeds {
        let refresh_interval_days = self.inner.settings.settings().refresh_interval_days;
        let mut needs = EnrichmentNeeds {
            never_enriched: 0,
            stale: 0,
            total: 0,
        };
        for publication in self.inner.publications.publications() {
            match publication.last_enriched {
                None => needs.never_enriched += 1,
                Some(_) if is_stale(publication.last_enriched, refresh_interval_days) => {
                    needs.stale += 1
                }
                Some(_) => {}
            }
        }
        needs.total = needs.never_enriched + needs.stale;
        needs
    }
}

/// A publication is stale when never enriched or enriched longer ago than the
/// refresh interval
fn is_stale(last_enriched: Option<DateTime<Utc>>, refresh_interval_days: i64) -> bool {
    match last_enriched {
        None => true,
        Some(date) => Utc::now() - date > chrono::Duration::days(refresh_interval_days),
    }
}
