//! Error types for the enrichment pipeline
//!
//! The description strings are part of the observable contract: the UI layer
//! surfaces them verbatim, and tests assert on them.

use thiserror::Error;

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichmentError>;

/// Main error type for enrichment operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    /// No usable identifier was supplied
    #[error("No identifier available for enrichment")]
    NoIdentifier,

    /// No registered source accepts the supplied identifiers
    #[error("No enrichment source available")]
    NoSourceAvailable,

    /// Transport-level failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The source throttled us (HTTP 429-equivalent)
    #[error("{}", rate_limited_description(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    /// Malformed response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The remote record does not exist
    #[error("Publication not found")]
    NotFound,

    /// The surrounding task was cancelled
    #[error("Enrichment cancelled")]
    Cancelled,

    /// Credentials absent or rejected (HTTP 401-equivalent)
    #[error("Authentication required for source: {source_id}")]
    AuthenticationRequired { source_id: String },
}

fn rate_limited_description(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("Rate limited, retry after {}s", secs),
        None => "Rate limited".to_string(),
    }
}
