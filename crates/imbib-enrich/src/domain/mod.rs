//! Domain models for the enrichment pipeline

pub mod enrichment;
pub mod identifiers;
pub mod search_result;

pub use enrichment::{
    AuthorStats, CapabilitySet, EnrichmentCapability, EnrichmentData, EnrichmentPriority,
    EnrichmentRequest, EnrichmentResult, EnrichmentState, OpenAccessStatus, PaperStub,
};
pub use identifiers::{IdentifierMap, IdentifierType, Identifiers, SourceId};
pub use search_result::SearchResult;
