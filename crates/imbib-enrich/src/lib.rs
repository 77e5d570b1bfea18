//! imbib-enrich: metadata enrichment pipeline for the imbib publication manager
//!
//! This library provides the publication enrichment core:
//! - Identifier resolution between bibliographic schemes (DOI, arXiv, bibcode, ...)
//! - A priority-ordered, deduplicating enrichment request queue
//! - Pluggable metadata source backends (NASA ADS, Semantic Scholar)
//! - Retry with exponential backoff and error-classified eligibility
//! - A background scheduler that refreshes stale publications
//!
//! The host application supplies publications and settings through the
//! `StalePublicationProvider` and `SettingsProvider` traits and drives the
//! pipeline through `EnrichmentService`.

pub mod domain;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod sources;

// Re-export main types for convenience
pub use domain::{
    AuthorStats, CapabilitySet, EnrichmentCapability, EnrichmentData, EnrichmentPriority,
    EnrichmentRequest, EnrichmentResult, EnrichmentState, IdentifierMap, IdentifierType,
    Identifiers, OpenAccessStatus, PaperStub, SearchResult, SourceId,
};
pub use error::{EnrichmentError, Result};
pub use identifiers::IdentifierResolver;
pub use queue::EnrichmentQueue;
pub use retry::{
    FailedRequestRecord, FailedRequestTracker, RetryContext, RetryExecutor, RetryPolicy,
    RetryResult, RetryableErrorType,
};
pub use scheduler::{
    BackgroundScheduler, EnrichmentNeeds, SchedulerStatistics, StalePublication,
    StalePublicationProvider,
};
pub use service::EnrichmentService;
pub use settings::{EnrichmentSettings, SettingsProvider, SettingsStore};
pub use sources::{AdsSource, EnrichmentSourcePlugin, SemanticScholarSource, SourceMetadata};
