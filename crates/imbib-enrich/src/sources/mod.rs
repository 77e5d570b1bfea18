//! Source plugins for enrichment backends

pub mod ads;
pub mod semantic_scholar;
pub mod traits;

pub use ads::AdsSource;
pub use semantic_scholar::SemanticScholarSource;
pub use traits::{translate_http, EnrichmentSourcePlugin, SourceMetadata};
