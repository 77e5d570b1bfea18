//! Enrichment domain types
//!
//! Data accumulated for a publication from external sources like NASA ADS and
//! Semantic Scholar, plus the request/state types the pipeline moves around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{IdentifierMap, SourceId};
use crate::error::EnrichmentError;

/// Open access availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OpenAccessStatus {
    /// Published in an open access journal
    Gold,
    /// Self-archived (preprint/postprint)
    Green,
    /// Free to read but not openly licensed
    Bronze,
    /// Open access article in subscription journal
    Hybrid,
    /// Not freely accessible
    Closed,
    /// Status not determined
    #[default]
    Unknown,
}

impl OpenAccessStatus {
    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            OpenAccessStatus::Gold => "Gold Open Access",
            OpenAccessStatus::Green => "Green Open Access",
            OpenAccessStatus::Bronze => "Bronze Open Access",
            OpenAccessStatus::Hybrid => "Hybrid Open Access",
            OpenAccessStatus::Closed => "Closed Access",
            OpenAccessStatus::Unknown => "Unknown",
        }
    }
}

/// Capabilities that an enrichment source can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrichmentCapability {
    /// Citation count
    CitationCount,
    /// List of references
    References,
    /// List of citing papers
    Citations,
    /// Paper abstract
    Abstract,
    /// PDF download URLs
    PdfUrl,
    /// Author statistics (h-index, etc.)
    AuthorStats,
    /// Open access status
    OpenAccess,
    /// Venue/journal information
    Venue,
}

impl EnrichmentCapability {
    /// Get all capabilities
    pub fn all() -> &'static [EnrichmentCapability] {
        &[
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::References,
            EnrichmentCapability::Citations,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::PdfUrl,
            EnrichmentCapability::AuthorStats,
            EnrichmentCapability::OpenAccess,
            EnrichmentCapability::Venue,
        ]
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            EnrichmentCapability::CitationCount => "Citation Count",
            EnrichmentCapability::References => "References",
            EnrichmentCapability::Citations => "Citing Papers",
            EnrichmentCapability::Abstract => "Abstract",
            EnrichmentCapability::PdfUrl => "PDF URL",
            EnrichmentCapability::AuthorStats => "Author Stats",
            EnrichmentCapability::OpenAccess => "Open Access",
            EnrichmentCapability::Venue => "Venue",
        }
    }
}

/// Set of capabilities declared by a source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: Vec<EnrichmentCapability>,
}

impl CapabilitySet {
    /// Build a set from a slice of capabilities
    pub fn new(capabilities: &[EnrichmentCapability]) -> Self {
        let mut set = Vec::new();
        for cap in capabilities {
            if !set.contains(cap) {
                set.push(*cap);
            }
        }
        Self { capabilities: set }
    }

    /// The full capability set
    pub fn all() -> Self {
        Self::new(EnrichmentCapability::all())
    }

    /// Membership test
    pub fn contains(&self, capability: EnrichmentCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentCapability> {
        self.capabilities.iter()
    }
}

/// Priority levels for enrichment requests
///
/// Ordering is by urgency: `UserTriggered` sorts before `BackgroundSync`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EnrichmentPriority {
    /// User explicitly requested enrichment
    UserTriggered,
    /// User recently viewed the paper
    RecentlyViewed,
    /// Paper is in the user's library
    LibraryPaper,
    /// Background periodic refresh
    BackgroundSync,
}

impl EnrichmentPriority {
    /// Get all priorities, most urgent first
    pub fn all() -> &'static [EnrichmentPriority] {
        &[
            EnrichmentPriority::UserTriggered,
            EnrichmentPriority::RecentlyViewed,
            EnrichmentPriority::LibraryPaper,
            EnrichmentPriority::BackgroundSync,
        ]
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            EnrichmentPriority::UserTriggered => "User Triggered",
            EnrichmentPriority::RecentlyViewed => "Recently Viewed",
            EnrichmentPriority::LibraryPaper => "Library Paper",
            EnrichmentPriority::BackgroundSync => "Background Sync",
        }
    }
}

/// Paper stub for references/citations
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PaperStub {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub citation_count: Option<i64>,
    pub reference_count: Option<i64>,
    pub is_open_access: bool,
    pub abstract_text: Option<String>,
}

/// Author statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorStats {
    /// Author ID (source-specific)
    pub author_id: String,
    /// Author name
    pub name: String,
    /// h-index if available
    pub h_index: Option<i32>,
    /// Total citation count
    pub citation_count: Option<i64>,
    /// Total paper count
    pub paper_count: Option<i64>,
    /// List of affiliations
    pub affiliations: Vec<String>,
}

/// Enrichment data for a publication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentData {
    /// Citation count
    pub citation_count: Option<i64>,
    /// Reference count
    pub reference_count: Option<i64>,
    /// References of this paper
    pub references: Vec<PaperStub>,
    /// Papers citing this paper
    pub citations: Vec<PaperStub>,
    /// Abstract text
    pub abstract_text: Option<String>,
    /// PDF download URLs
    pub pdf_urls: Vec<String>,
    /// Open access status
    pub open_access_status: OpenAccessStatus,
    /// Venue (journal/conference)
    pub venue: Option<String>,
    /// Author statistics
    pub author_stats: Vec<AuthorStats>,
    /// Source that provided this data
    pub source: SourceId,
    /// When the data was fetched
    pub fetched_at: DateTime<Utc>,
}

impl EnrichmentData {
    /// Create an empty record attributed to `source`, stamped now
    pub fn new(source: SourceId) -> Self {
        Self {
            citation_count: None,
            reference_count: None,
            references: Vec::new(),
            citations: Vec::new(),
            abstract_text: None,
            pdf_urls: Vec::new(),
            open_access_status: OpenAccessStatus::Unknown,
            venue: None,
            author_stats: Vec::new(),
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Merge freshly fetched data over this record.
    ///
    /// Every field prefers the new value when present; an absent new field
    /// (None, empty list, `Unknown` status) falls back to the existing value.
    /// `source` and `fetched_at` always come from the new result.
    pub fn merged_with(&self, new: &EnrichmentData) -> EnrichmentData {
        EnrichmentData {
            citation_count: new.citation_count.or(self.citation_count),
            reference_count: new.reference_count.or(self.reference_count),
            references: if new.references.is_empty() {
                self.references.clone()
            } else {
                new.references.clone()
            },
            citations: if new.citations.is_empty() {
                self.citations.clone()
            } else {
                new.citations.clone()
            },
            abstract_text: new
                .abstract_text
                .clone()
                .or_else(|| self.abstract_text.clone()),
            pdf_urls: if new.pdf_urls.is_empty() {
                self.pdf_urls.clone()
            } else {
                new.pdf_urls.clone()
            },
            open_access_status: if new.open_access_status == OpenAccessStatus::Unknown {
                self.open_access_status
            } else {
                new.open_access_status
            },
            venue: new.venue.clone().or_else(|| self.venue.clone()),
            author_stats: if new.author_stats.is_empty() {
                self.author_stats.clone()
            } else {
                new.author_stats.clone()
            },
            source: new.source,
            fetched_at: new.fetched_at,
        }
    }

    /// Check if the data is stale (older than threshold days)
    pub fn is_stale(&self, threshold_days: i64) -> bool {
        Utc::now() - self.fetched_at > chrono::Duration::days(threshold_days)
    }
}

/// Result of a single enrichment call
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    /// The (merged) enrichment data
    pub data: EnrichmentData,
    /// Identifiers known after enrichment, possibly more than were supplied
    pub resolved_identifiers: IdentifierMap,
}

/// Enrichment lifecycle of a single publication
///
/// `Idle`, `Complete` and `Failed` are resting states; `Pending` and
/// `Enriching` are the only loading states.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentState {
    /// No enrichment requested
    Idle,
    /// Queued, waiting to be picked up
    Pending,
    /// A source call is in flight
    Enriching,
    /// Enrichment finished successfully
    Complete(EnrichmentData),
    /// Enrichment failed
    Failed(EnrichmentError),
}

impl EnrichmentState {
    /// True for the in-flight states only
    pub fn is_loading(&self) -> bool {
        matches!(self, EnrichmentState::Pending | EnrichmentState::Enriching)
    }

    /// True for the resting states
    pub fn is_resting(&self) -> bool {
        !self.is_loading()
    }
}

/// A queued enrichment request
///
/// Identity is `publication_id`: at most one live request per publication may
/// exist in a queue at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    /// Opaque unique publication identifier
    pub publication_id: String,
    /// Identifiers known for the publication
    pub identifiers: IdentifierMap,
    /// Request urgency
    pub priority: EnrichmentPriority,
    /// When the request was created
    pub enqueued_at: DateTime<Utc>,
}

impl EnrichmentRequest {
    pub fn new(
        publication_id: impl Into<String>,
        identifiers: IdentifierMap,
        priority: EnrichmentPriority,
    ) -> Self {
        Self {
            publication_id: publication_id.into(),
            identifiers,
            priority,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifiers::IdentifierType;

    #[test]
    fn test_enrichment_priority_ordering() {
        assert!(EnrichmentPriority::UserTriggered < EnrichmentPriority::BackgroundSync);
        assert!(EnrichmentPriority::RecentlyViewed < EnrichmentPriority::LibraryPaper);
    }

    #[test]
    fn test_priority_display_names() {
        assert_eq!(
            EnrichmentPriority::UserTriggered.display_name(),
            "User Triggered"
        );
        assert_eq!(
            EnrichmentPriority::BackgroundSync.display_name(),
            "Background Sync"
        );
    }

    #[test]
    fn test_open_access_display_names() {
        assert_eq!(OpenAccessStatus::Gold.display_name(), "Gold Open Access");
        assert_eq!(OpenAccessStatus::Closed.display_name(), "Closed Access");
    }

    #[test]
    fn test_capability_set_contains() {
        let set = CapabilitySet::new(&[
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::Abstract,
        ]);
        assert!(set.contains(EnrichmentCapability::CitationCount));
        assert!(!set.contains(EnrichmentCapability::AuthorStats));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_capability_set_all() {
        let set = CapabilitySet::all();
        for cap in EnrichmentCapability::all() {
            assert!(set.contains(*cap));
        }
    }

    #[test]
    fn test_capability_set_dedups() {
        let set = CapabilitySet::new(&[
            EnrichmentCapability::Venue,
            EnrichmentCapability::Venue,
        ]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_merge_prefers_new_non_nil() {
        let mut existing = EnrichmentData::new(SourceId::Ads);
        existing.citation_count = Some(100);
        existing.abstract_text = Some("X".to_string());

        let mut new = EnrichmentData::new(SourceId::SemanticScholar);
        new.citation_count = Some(150);
        new.abstract_text = None;

        let merged = existing.merged_with(&new);
        assert_eq!(merged.citation_count, Some(150));
        assert_eq!(merged.abstract_text, Some("X".to_string()));
        assert_eq!(merged.source, SourceId::SemanticScholar);
        assert_eq!(merged.fetched_at, new.fetched_at);
    }

    #[test]
    fn test_merge_keeps_old_lists_when_new_empty() {
        let mut existing = EnrichmentData::new(SourceId::Ads);
        existing.pdf_urls = vec!["https://arxiv.org/pdf/2301.12345".to_string()];
        existing.open_access_status = OpenAccessStatus::Green;

        let new = EnrichmentData::new(SourceId::Ads);
        let merged = existing.merged_with(&new);
        assert_eq!(merged.pdf_urls, existing.pdf_urls);
        assert_eq!(merged.open_access_status, OpenAccessStatus::Green);
    }

    #[test]
    fn test_is_stale() {
        let mut data = EnrichmentData::new(SourceId::Ads);
        assert!(!data.is_stale(7));

        data.fetched_at = Utc::now() - chrono::Duration::days(30);
        assert!(data.is_stale(7));
        assert!(!data.is_stale(60));
    }

    #[test]
    fn test_state_loading() {
        assert!(EnrichmentState::Pending.is_loading());
        assert!(EnrichmentState::Enriching.is_loading());
        assert!(EnrichmentState::Idle.is_resting());
        assert!(EnrichmentState::Complete(EnrichmentData::new(SourceId::Ads)).is_resting());
        assert!(EnrichmentState::Failed(EnrichmentError::NotFound).is_resting());
    }

    #[test]
    fn test_request_constructor_stamps_time() {
        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Doi, "10.1234/test".to_string());
        let request =
            EnrichmentRequest::new("pub-1", ids, EnrichmentPriority::UserTriggered);
        assert_eq!(request.publication_id, "pub-1");
        assert!(Utc::now() - request.enqueued_at < chrono::Duration::seconds(5));
    }
}
