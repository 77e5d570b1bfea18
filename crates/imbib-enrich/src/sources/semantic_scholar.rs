//! Semantic Scholar source plugin
//!
//! Uses the Academic Graph API paper lookup, which accepts DOIs, arXiv IDs and
//! PubMed IDs in prefixed form (`DOI:...`, `ARXIV:...`, `PMID:...`) alongside
//! its own paper IDs. No API key required at modest rates.

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{merge_identifiers, translate_http, EnrichmentSourcePlugin, SourceMetadata};
use crate::domain::enrichment::{
    CapabilitySet, EnrichmentData, EnrichmentResult, OpenAccessStatus, PaperStub,
};
use crate::domain::identifiers::{IdentifierMap, IdentifierType, SourceId};
use crate::error::{EnrichmentError, Result};
use crate::http::HttpClient;
use crate::identifiers::resolver::{
    resolve_arxiv_to_semantic_scholar, resolve_doi_to_semantic_scholar,
    resolve_pmid_to_semantic_scholar,
};

const S2_API_URL: &str = "https://api.semanticscholar.org/graph/v1";
const ENRICHMENT_FIELDS: &str = "paperId,externalIds,citationCount,referenceCount,abstract,venue,\
     isOpenAccess,openAccessPdf,citations.paperId,citations.title,citations.year,\
     references.paperId,references.title,references.year";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    external_ids: Option<S2ExternalIds>,
    citation_count: Option<i64>,
    reference_count: Option<i64>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
    is_open_access: Option<bool>,
    open_access_pdf: Option<S2OpenAccessPdf>,
    citations: Option<Vec<S2PaperStub>>,
    references: Option<Vec<S2PaperStub>>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
    #[serde(rename = "PubMed")]
    pubmed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2PaperStub {
    paper_id: Option<String>,
    title: Option<String>,
    year: Option<i32>,
}

pub struct SemanticScholarSource {
    client: HttpClient,
    base_url: String,
}

impl SemanticScholarSource {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("imbib/1.0 (https://imbib.app)"),
            base_url: S2_API_URL.to_string(),
        }
    }

    /// Point the source at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The lookup key for the paper endpoint, most specific first
    fn lookup_id(identifiers: &IdentifierMap) -> Option<String> {
        if let Some(s2) = identifiers.get(&IdentifierType::SemanticScholar) {
            return Some(s2.clone());
        }
        if let Some(doi) = identifiers.get(&IdentifierType::Doi) {
            return Some(resolve_doi_to_semantic_scholar(doi));
        }
        if let Some(arxiv) = identifiers.get(&IdentifierType::Arxiv) {
            return Some(resolve_arxiv_to_semantic_scholar(arxiv));
        }
        identifiers
            .get(&IdentifierType::Pmid)
            .map(|pmid| resolve_pmid_to_semantic_scholar(pmid))
    }

    /// Parse a paper lookup response into enrichment data
    pub fn parse_paper_response(json: &str) -> Result<(EnrichmentData, IdentifierMap)> {
        let paper: S2Paper = serde_json::from_str(json).map_err(|e| {
            EnrichmentError::ParseError(format!("Invalid Semantic Scholar JSON: {}", e))
        })?;

        let mut data = EnrichmentData::new(SourceId::SemanticScholar);
        data.citation_count = paper.citation_count;
        data.reference_count = paper.reference_count;
        data.abstract_text = paper.abstract_text;
        data.venue = paper.venue.filter(|v| !v.is_empty());
        data.open_access_status = match paper.is_open_access {
            Some(true) => OpenAccessStatus::Green,
            Some(false) => OpenAccessStatus::Closed,
            None => OpenAccessStatus::Unknown,
        };
        if let Some(url) = paper.open_access_pdf.and_then(|pdf| pdf.url) {
            data.pdf_urls.push(url);
        }
        data.citations = paper
            .citations
            .unwrap_or_default()
            .into_iter()
            .filter_map(stub_from_s2)
            .collect();
        data.references = paper
            .references
            .unwrap_or_default()
            .into_iter()
            .filter_map(stub_from_s2)
            .collect();

        let mut identifiers = IdentifierMap::new();
        if let Some(paper_id) = paper.paper_id {
            identifiers.insert(IdentifierType::SemanticScholar, paper_id);
        }
        if let Some(external) = paper.external_ids {
            if let Some(doi) = external.doi {
                identifiers.insert(IdentifierType::Doi, doi);
            }
            if let Some(arxiv) = external.arxiv {
                identifiers.insert(IdentifierType::Arxiv, arxiv);
            }
            if let Some(pmid) = external.pubmed {
                identifiers.insert(IdentifierType::Pmid, pmid);
            }
        }

        Ok((data, identifiers))
    }
}

impl Default for SemanticScholarSource {
    fn default() -> Self {
        Self::new()
    }
}

fn stub_from_s2(stub: S2PaperStub) -> Option<PaperStub> {
    let title = stub.title?;
    Some(PaperStub {
        id: stub.paper_id.unwrap_or_default(),
        title,
        authors: Vec::new(),
        year: stub.year,
        venue: None,
        doi: None,
        arxiv_id: None,
        citation_count: None,
        reference_count: None,
        is_open_access: false,
        abstract_text: None,
    })
}

#[async_trait]
impl EnrichmentSourcePlugin for SemanticScholarSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: SourceId::SemanticScholar,
            name: "Semantic Scholar",
            description: "AI2 academic graph across all fields of science",
            base_url: "https://www.semanticscholar.org",
            requires_api_key: false,
        }
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    async fn enrich(
        &self,
        identifiers: &IdentifierMap,
        _existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentResult> {
        let lookup = Self::lookup_id(identifiers).ok_or(EnrichmentError::NoIdentifier)?;

        tracing::debug!(lookup = %lookup, "querying Semantic Scholar");
        let url = format!(
            "{}/paper/{}?fields={}",
            self.base_url,
            urlencoding::encode(&lookup),
            ENRICHMENT_FIELDS
        );
        let response = self
            .client
            .get(&url, None)
            .await
            .map_err(|e| translate_http(SourceId::SemanticScholar, e))?;

        let (data, derived) = Self::parse_paper_response(&response.body)?;

        Ok(EnrichmentResult {
            data,
            resolved_identifiers: merge_identifiers(identifiers, derived),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::EnrichmentCapability;

    const SAMPLE_RESPONSE: &str = r#"{
        "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
        "externalIds": {"DOI": "10.1234/test", "ArXiv": "2301.12345"},
        "citationCount": 117,
        "referenceCount": 59,
        "abstract": "We study everything.",
        "venue": "Nature",
        "isOpenAccess": true,
        "openAccessPdf": {"url": "https://example.org/paper.pdf"},
        "citations": [{"paperId": "c1", "title": "A citing paper", "year": 2024}],
        "references": [{"paperId": "r1", "title": "A cited paper", "year": 2019}]
    }"#;

    #[test]
    fn test_parse_paper_response() {
        let (data, identifiers) =
            SemanticScholarSource::parse_paper_response(SAMPLE_RESPONSE).unwrap();
        assert_eq!(data.citation_count, Some(117));
        assert_eq!(data.reference_count, Some(59));
        assert_eq!(data.abstract_text, Some("We study everything.".to_string()));
        assert_eq!(data.venue, Some("Nature".to_string()));
        assert_eq!(data.open_access_status, OpenAccessStatus::Green);
        assert_eq!(data.pdf_urls, vec!["https://example.org/paper.pdf".to_string()]);
        assert_eq!(data.citations.len(), 1);
        assert_eq!(data.references.len(), 1);
        assert_eq!(data.source, SourceId::SemanticScholar);

        assert_eq!(
            identifiers.get(&IdentifierType::Doi).map(String::as_str),
            Some("10.1234/test")
        );
        assert!(identifiers.contains_key(&IdentifierType::SemanticScholar));
    }

    #[test]
    fn test_parse_minimal_response() {
        let (data, _) =
            SemanticScholarSource::parse_paper_response(r#"{"paperId": "abc"}"#).unwrap();
        assert_eq!(data.citation_count, None);
        assert_eq!(data.abstract_text, None);
        assert!(data.pdf_urls.is_empty());
        assert_eq!(data.open_access_status, OpenAccessStatus::Unknown);
    }

    #[test]
    fn test_lookup_id_preference() {
        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Doi, "10.1234/test".to_string());
        ids.insert(IdentifierType::Pmid, "12345678".to_string());
        assert_eq!(
            SemanticScholarSource::lookup_id(&ids),
            Some("DOI:10.1234/test".to_string())
        );

        let mut own_id = ids.clone();
        own_id.insert(IdentifierType::SemanticScholar, "abc123".to_string());
        assert_eq!(
            SemanticScholarSource::lookup_id(&own_id),
            Some("abc123".to_string())
        );

        assert_eq!(SemanticScholarSource::lookup_id(&IdentifierMap::new()), None);
    }

    #[test]
    fn test_can_enrich() {
        let source = SemanticScholarSource::default();
        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Pmid, "12345678".to_string());
        assert!(source.can_enrich(&ids));

        let mut bibcode_only = IdentifierMap::new();
        bibcode_only.insert(IdentifierType::Bibcode, "2020ApJ...123...45A".to_string());
        assert!(!source.can_enrich(&bibcode_only));
    }

    #[test]
    fn test_supports_all_capabilities() {
        let source = SemanticScholarSource::default();
        assert!(source.supports(EnrichmentCapability::AuthorStats));
        assert!(source.supports(EnrichmentCapability::CitationCount));
    }
}
