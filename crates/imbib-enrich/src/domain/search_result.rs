//! Search result representation from online sources

use serde::{Deserialize, Serialize};

use super::identifiers::{IdentifierMap, Identifiers, SourceId};

/// A search result from an online source
///
/// The slim shape the enrichment pipeline consumes: enough to identify the
/// publication and hand its identifiers to `EnrichmentService`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Source-specific record ID (bibcode, paper ID, ...)
    pub source_id: String,
    /// Which source produced the result
    pub source: SourceId,
    pub title: String,
    pub year: Option<i32>,
    pub identifiers: Identifiers,
    pub citation_count: Option<i64>,
}

impl SearchResult {
    /// Identifier map derived from the result's own identifier fields
    pub fn identifier_map(&self) -> IdentifierMap {
        self.identifiers.identifier_map()
    }
}
