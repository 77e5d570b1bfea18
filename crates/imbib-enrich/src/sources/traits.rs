//! Common contract for source plugins
//!
//! Each backend implements `EnrichmentSourcePlugin`; the service holds them as
//! trait objects and never downcasts to a concrete backend.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::enrichment::{CapabilitySet, EnrichmentCapability, EnrichmentData, EnrichmentResult};
use crate::domain::identifiers::{IdentifierMap, IdentifierType, SourceId};
use crate::error::{EnrichmentError, Result};
use crate::http::HttpError;
use crate::identifiers::resolver::can_resolve;

/// Metadata about a source
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    pub id: SourceId,
    pub name: &'static str,
    pub description: &'static str,
    pub base_url: &'static str,
    pub requires_api_key: bool,
}

/// Translate an HTTP-layer failure into the enrichment error taxonomy
pub fn translate_http(source: SourceId, error: HttpError) -> EnrichmentError {
    match error {
        HttpError::RequestFailed { message } => EnrichmentError::NetworkError(message),
        HttpError::InvalidUrl { url } => {
            EnrichmentError::NetworkError(format!("invalid URL: {}", url))
        }
        HttpError::Timeout => EnrichmentError::NetworkError("request timed out".to_string()),
        HttpError::Unauthorized => EnrichmentError::AuthenticationRequired {
            source_id: source.as_str().to_string(),
        },
        HttpError::NotFound => EnrichmentError::NotFound,
        HttpError::RateLimited { retry_after_secs } => {
            EnrichmentError::RateLimited { retry_after_secs }
        }
        HttpError::ServerError { status } => {
            EnrichmentError::NetworkError(format!("server error (HTTP {})", status))
        }
        HttpError::ParseError { message } => EnrichmentError::ParseError(message),
    }
}

/// Capability-described metadata backend
#[async_trait]
pub trait EnrichmentSourcePlugin: Send + Sync {
    /// Identity and display information
    fn metadata(&self) -> SourceMetadata;

    /// Which optional metadata fields this source can supply
    fn capabilities(&self) -> CapabilitySet;

    /// Fetch enrichment data for the given identifiers.
    ///
    /// Fails with `NoIdentifier` when no accepted identifier type is present,
    /// `NotFound` when the remote record does not exist, and the rest of the
    /// taxonomy for transport-level conditions.
    async fn enrich(
        &self,
        identifiers: &IdentifierMap,
        existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentResult>;

    /// Augment identifiers by construction (never a network lookup).
    ///
    /// The default passes identifiers through unchanged.
    fn resolve_identifier(&self, identifiers: &IdentifierMap) -> IdentifierMap {
        identifiers.clone()
    }

    /// Whether at least one accepted identifier type is present
    fn can_enrich(&self, identifiers: &IdentifierMap) -> bool {
        can_resolve(identifiers, self.metadata().id)
    }

    /// Capability-set membership test
    fn supports(&self, capability: EnrichmentCapability) -> bool {
        self.capabilities().contains(capability)
    }
}

/// Insert derived identifiers without overwriting caller-supplied ones
pub(crate) fn merge_identifiers(
    base: &IdentifierMap,
    derived: HashMap<IdentifierType, String>,
) -> IdentifierMap {
    let mut merged = base.clone();
    for (id_type, value) in derived {
        merged.entry(id_type).or_insert(value);
    }
    merged
}
