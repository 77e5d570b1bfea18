//! Scientific publication identifiers
//!
//! Identifier types across the enrichment sources, plus the typed identifier
//! map used throughout the pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Types of publication identifiers across different sources
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    /// Digital Object Identifier
    Doi,
    /// arXiv preprint identifier
    Arxiv,
    /// PubMed identifier
    Pmid,
    /// PubMed Central identifier
    Pmcid,
    /// NASA ADS bibcode
    Bibcode,
    /// Semantic Scholar paper ID
    SemanticScholar,
    /// OpenAlex work ID
    OpenAlex,
}

impl IdentifierType {
    /// Get all identifier types
    pub fn all() -> &'static [IdentifierType] {
        &[
            IdentifierType::Doi,
            IdentifierType::Arxiv,
            IdentifierType::Pmid,
            IdentifierType::Pmcid,
            IdentifierType::Bibcode,
            IdentifierType::SemanticScholar,
            IdentifierType::OpenAlex,
        ]
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Doi => "doi",
            IdentifierType::Arxiv => "arxiv",
            IdentifierType::Pmid => "pmid",
            IdentifierType::Pmcid => "pmcid",
            IdentifierType::Bibcode => "bibcode",
            IdentifierType::SemanticScholar => "semanticscholar",
            IdentifierType::OpenAlex => "openalex",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            IdentifierType::Doi => "DOI",
            IdentifierType::Arxiv => "arXiv",
            IdentifierType::Pmid => "PubMed",
            IdentifierType::Pmcid => "PMC",
            IdentifierType::Bibcode => "ADS Bibcode",
            IdentifierType::SemanticScholar => "Semantic Scholar",
            IdentifierType::OpenAlex => "OpenAlex",
        }
    }

    /// URL prefix for the identifier's landing page
    pub fn url_prefix(&self) -> &'static str {
        match self {
            IdentifierType::Doi => "https://doi.org/",
            IdentifierType::Arxiv => "https://arxiv.org/abs/",
            IdentifierType::Pmid => "https://pubmed.ncbi.nlm.nih.gov/",
            IdentifierType::Pmcid => "https://www.ncbi.nlm.nih.gov/pmc/articles/",
            IdentifierType::Bibcode => "https://ui.adsabs.harvard.edu/abs/",
            IdentifierType::SemanticScholar => "https://www.semanticscholar.org/paper/",
            IdentifierType::OpenAlex => "https://openalex.org/works/",
        }
    }

    /// Full landing-page URL for a given identifier value
    pub fn url(&self, value: &str) -> String {
        format!("{}{}", self.url_prefix(), value)
    }
}

/// Enrichment backends known to the pipeline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// NASA Astrophysics Data System
    Ads,
    /// Semantic Scholar
    SemanticScholar,
}

impl SourceId {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Ads => "ads",
            SourceId::SemanticScholar => "semanticscholar",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Ads => "NASA ADS",
            SourceId::SemanticScholar => "Semantic Scholar",
        }
    }
}

/// A typed identifier map: one value per identifier scheme
pub type IdentifierMap = HashMap<IdentifierType, String>;

/// Collection of publication identifiers as carried by search results
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Identifiers {
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub pmid: Option<String>,
    pub pmcid: Option<String>,
    pub bibcode: Option<String>,
    pub semantic_scholar_id: Option<String>,
}

impl Identifiers {
    /// Check if all identifiers are empty
    pub fn is_empty(&self) -> bool {
        self.doi.is_none()
            && self.arxiv_id.is_none()
            && self.pmid.is_none()
            && self.pmcid.is_none()
            && self.bibcode.is_none()
            && self.semantic_scholar_id.is_none()
    }

    /// Convert to the typed identifier map used by the enrichment pipeline
    pub fn identifier_map(&self) -> IdentifierMap {
        let mut map = IdentifierMap::new();
        if let Some(ref doi) = self.doi {
            map.insert(IdentifierType::Doi, doi.clone());
        }
        if let Some(ref arxiv) = self.arxiv_id {
            map.insert(IdentifierType::Arxiv, arxiv.clone());
        }
        if let Some(ref pmid) = self.pmid {
            map.insert(IdentifierType::Pmid, pmid.clone());
        }
        if let Some(ref pmcid) = self.pmcid {
            map.insert(IdentifierType::Pmcid, pmcid.clone());
        }
        if let Some(ref bibcode) = self.bibcode {
            map.insert(IdentifierType::Bibcode, bibcode.clone());
        }
        if let Some(ref s2) = self.semantic_scholar_id {
            map.insert(IdentifierType::SemanticScholar, s2.clone());
        }
        map
    }
}
