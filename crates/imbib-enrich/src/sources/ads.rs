//! NASA ADS (Astrophysics Data System) source plugin
//!
//! API docs: https://ui.adsabs.harvard.edu/help/api/
//! Rate limit: 5000 requests/day, 5 requests/second burst

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{merge_identifiers, translate_http, EnrichmentSourcePlugin, SourceMetadata};
use crate::domain::enrichment::{
    CapabilitySet, EnrichmentCapability, EnrichmentData, EnrichmentResult, OpenAccessStatus,
};
use crate::domain::identifiers::{IdentifierMap, IdentifierType, SourceId};
use crate::error::{EnrichmentError, Result};
use crate::http::HttpClient;
use crate::identifiers::resolver::preferred_identifier;

const ADS_API_URL: &str = "https://api.adsabs.harvard.edu/v1";
const ENRICHMENT_FIELDS: &str =
    "bibcode,abstract,citation_count,reference,esources,property,pub,doi,identifier";

/// ADS API response wrapper
#[derive(Debug, Deserialize)]
struct AdsResponse {
    response: AdsResponseBody,
}

#[derive(Debug, Deserialize)]
struct AdsResponseBody {
    docs: Vec<AdsDocument>,
}

/// Single document from ADS search results
#[derive(Debug, Deserialize)]
struct AdsDocument {
    bibcode: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    citation_count: Option<i64>,
    #[serde(rename = "reference")]
    references: Option<Vec<String>>,
    esources: Option<Vec<String>>,
    property: Option<Vec<String>>,
    #[serde(rename = "pub")]
    publication: Option<String>,
    doi: Option<Vec<String>>,
    identifier: Option<Vec<String>>,
}

pub struct AdsSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl AdsSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: HttpClient::new("imbib/1.0 (https://imbib.app)"),
            base_url: ADS_API_URL.to_string(),
            api_key,
        }
    }

    /// Point the source at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse an ADS search response into enrichment data.
    ///
    /// Returns `NotFound` when no document matched. Optional fields the
    /// response omits stay empty rather than defaulting to placeholders.
    pub fn parse_enrichment_response(json: &str) -> Result<(EnrichmentData, IdentifierMap)> {
        let response: AdsResponse = serde_json::from_str(json)
            .map_err(|e| EnrichmentError::ParseError(format!("Invalid ADS JSON: {}", e)))?;

        let doc = response
            .response
            .docs
            .into_iter()
            .next()
            .ok_or(EnrichmentError::NotFound)?;

        Ok(Self::document_to_data(doc))
    }

    fn document_to_data(doc: AdsDocument) -> (EnrichmentData, IdentifierMap) {
        let doi = doc.doi.as_ref().and_then(|d| d.first().cloned());
        let arxiv_id = extract_arxiv_id_from_identifiers(&doc.identifier);

        let mut data = EnrichmentData::new(SourceId::Ads);
        data.citation_count = doc.citation_count;
        data.reference_count = doc.references.as_ref().map(|r| r.len() as i64);
        data.abstract_text = doc.abstract_text;
        data.venue = doc.publication;
        data.pdf_urls = build_pdf_urls(
            doc.esources.as_deref().unwrap_or_default(),
            doi.as_deref(),
            arxiv_id.as_deref(),
            &doc.bibcode,
        );
        data.open_access_status = open_access_from_properties(doc.property.as_deref());

        let mut identifiers = IdentifierMap::new();
        identifiers.insert(IdentifierType::Bibcode, doc.bibcode);
        if let Some(doi) = doi {
            identifiers.insert(IdentifierType::Doi, doi);
        }
        if let Some(arxiv) = arxiv_id {
            identifiers.insert(IdentifierType::Arxiv, arxiv);
        }

        (data, identifiers)
    }
}

impl Default for AdsSource {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl EnrichmentSourcePlugin for AdsSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: SourceId::Ads,
            name: "NASA ADS",
            description: "Astrophysics Data System for astronomy and physics",
            base_url: "https://ui.adsabs.harvard.edu",
            requires_api_key: true,
        }
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(&[
            EnrichmentCapability::CitationCount,
            EnrichmentCapability::References,
            EnrichmentCapability::Citations,
            EnrichmentCapability::Abstract,
            EnrichmentCapability::PdfUrl,
            EnrichmentCapability::OpenAccess,
            EnrichmentCapability::Venue,
        ])
    }

    async fn enrich(
        &self,
        identifiers: &IdentifierMap,
        _existing: Option<&EnrichmentData>,
    ) -> Result<EnrichmentResult> {
        let (id_type, value) = preferred_identifier(identifiers, SourceId::Ads)
            .ok_or(EnrichmentError::NoIdentifier)?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EnrichmentError::AuthenticationRequired {
                source_id: SourceId::Ads.as_str().to_string(),
            })?;

        let query = match id_type {
            IdentifierType::Bibcode => format!("bibcode:\"{}\"", value),
            IdentifierType::Doi => format!("doi:\"{}\"", value),
            IdentifierType::Arxiv => format!("arXiv:\"{}\"", value),
            _ => return Err(EnrichmentError::NoIdentifier),
        };

        tracing::debug!(query = %query, "querying ADS");
        let url = format!("{}/search/query", self.base_url);
        let response = self
            .client
            .get_with_params(
                &url,
                &[("q", query.as_str()), ("fl", ENRICHMENT_FIELDS), ("rows", "1")],
                Some(api_key),
            )
            .await
            .map_err(|e| translate_http(SourceId::Ads, e))?;

        let (data, derived) = Self::parse_enrichment_response(&response.body)?;

        Ok(EnrichmentResult {
            data,
            resolved_identifiers: merge_identifiers(identifiers, derived),
        })
    }

    fn resolve_identifier(&self, identifiers: &IdentifierMap) -> IdentifierMap {
        let mut resolved = identifiers.clone();
        if !resolved.contains_key(&IdentifierType::Bibcode) {
            // Constructed query form, not a real bibcode; ADS accepts both.
            let constructed = if let Some(doi) = resolved.get(&IdentifierType::Doi) {
                Some(format!("doi:{}", doi))
            } else {
                resolved
                    .get(&IdentifierType::Arxiv)
                    .map(|arxiv| format!("arXiv:{}", arxiv))
            };
            if let Some(bibcode) = constructed {
                resolved.insert(IdentifierType::Bibcode, bibcode);
            }
        }
        resolved
    }
}

/// Extract arXiv ID from ADS identifier array
fn extract_arxiv_id_from_identifiers(identifiers: &Option<Vec<String>>) -> Option<String> {
    identifiers.as_ref()?.iter().find_map(|id| {
        if let Some(stripped) = id.strip_prefix("arXiv:") {
            Some(stripped.to_string())
        } else if id.chars().next()?.is_ascii_digit() && id.contains('.') {
            // New format: 2301.12345
            Some(id.clone())
        } else {
            None
        }
    })
}

/// Build PDF URLs from the ADS esources field
///
/// Priority:
/// 1. Direct arXiv PDF for preprints
/// 2. DOI resolver for publisher
/// 3. ADS scans for historical papers
fn build_pdf_urls(
    esources: &[String],
    doi: Option<&str>,
    arxiv_id: Option<&str>,
    bibcode: &str,
) -> Vec<String> {
    let mut urls = Vec::new();

    for esource in esources {
        let upper = esource.to_uppercase();

        if upper == "EPRINT_PDF" {
            if let Some(arxiv) = arxiv_id {
                urls.push(format!("https://arxiv.org/pdf/{}.pdf", arxiv));
            }
        } else if upper == "PUB_PDF" || upper == "PUB_HTML" {
            if let Some(d) = doi {
                if !d.is_empty() {
                    urls.push(format!("https://doi.org/{}", d));
                }
            }
        } else if upper == "ADS_PDF" || upper == "ADS_SCAN" {
            urls.push(format!("https://articles.adsabs.harvard.edu/pdf/{}", bibcode));
        }
    }

    urls.dedup();
    urls
}

fn open_access_from_properties(properties: Option<&[String]>) -> OpenAccessStatus {
    let Some(properties) = properties else {
        return OpenAccessStatus::Unknown;
    };
    if properties.iter().any(|p| p == "EPRINT_OPENACCESS") {
        OpenAccessStatus::Green
    } else if properties.iter().any(|p| p == "OPENACCESS") {
        OpenAccessStatus::Bronze
    } else {
        OpenAccessStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "response": {
            "docs": [{
                "bibcode": "2023ApJ...123..456A",
                "abstract": "We study stars.",
                "citation_count": 42,
                "reference": ["2020ApJ...111..222B", "2021ApJ...333..444C"],
                "esources": ["EPRINT_PDF", "PUB_PDF"],
                "property": ["EPRINT_OPENACCESS"],
                "pub": "The Astrophysical Journal",
                "doi": ["10.3847/1234-5678"],
                "identifier": ["arXiv:2301.12345"]
            }]
        }
    }"#;

    const MINIMAL_RESPONSE: &str = r#"{
        "response": {
            "docs": [{
                "bibcode": "2023ApJ...123..456A",
                "citation_count": 0
            }]
        }
    }"#;

    #[test]
    fn test_parse_enrichment_response() {
        let (data, identifiers) = AdsSource::parse_enrichment_response(SAMPLE_RESPONSE).unwrap();
        assert_eq!(data.citation_count, Some(42));
        assert_eq!(data.reference_count, Some(2));
        assert_eq!(data.abstract_text, Some("We study stars.".to_string()));
        assert_eq!(data.venue, Some("The Astrophysical Journal".to_string()));
        assert_eq!(data.open_access_status, OpenAccessStatus::Green);
        assert_eq!(data.source, SourceId::Ads);
        assert!(data.pdf_urls.iter().any(|u| u.contains("arxiv.org")));
        assert!(data.pdf_urls.iter().any(|u| u.contains("doi.org")));

        assert_eq!(
            identifiers.get(&IdentifierType::Bibcode).map(String::as_str),
            Some("2023ApJ...123..456A")
        );
        assert_eq!(
            identifiers.get(&IdentifierType::Arxiv).map(String::as_str),
            Some("2301.12345")
        );
    }

    #[test]
    fn test_minimal_response_leaves_optionals_empty() {
        let (data, _) = AdsSource::parse_enrichment_response(MINIMAL_RESPONSE).unwrap();
        assert_eq!(data.citation_count, Some(0));
        assert_eq!(data.reference_count, None);
        assert_eq!(data.abstract_text, None);
        assert_eq!(data.venue, None);
        assert!(data.pdf_urls.is_empty());
        assert_eq!(data.open_access_status, OpenAccessStatus::Unknown);
    }

    #[test]
    fn test_parse_empty_docs_is_not_found() {
        let json = r#"{"response": {"docs": []}}"#;
        assert_eq!(
            AdsSource::parse_enrichment_response(json).unwrap_err(),
            EnrichmentError::NotFound
        );
    }

    #[test]
    fn test_parse_invalid_json_is_parse_error() {
        let err = AdsSource::parse_enrichment_response("{not json").unwrap_err();
        assert!(matches!(err, EnrichmentError::ParseError(_)));
    }

    #[test]
    fn test_extract_arxiv_id() {
        let ids = Some(vec!["arXiv:2301.12345".to_string()]);
        assert_eq!(
            extract_arxiv_id_from_identifiers(&ids),
            Some("2301.12345".to_string())
        );

        let ids2 = Some(vec!["2301.12345".to_string()]);
        assert_eq!(
            extract_arxiv_id_from_identifiers(&ids2),
            Some("2301.12345".to_string())
        );
    }

    #[test]
    fn test_can_enrich_accepts_ads_identifiers() {
        let source = AdsSource::default();
        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Doi, "10.1234/test".to_string());
        assert!(source.can_enrich(&ids));

        let mut pmid_only = IdentifierMap::new();
        pmid_only.insert(IdentifierType::Pmid, "12345678".to_string());
        assert!(!source.can_enrich(&pmid_only));

        assert!(!source.can_enrich(&IdentifierMap::new()));
    }

    #[test]
    fn test_resolve_identifier_constructs_bibcode_form() {
        let source = AdsSource::default();

        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Doi, "10.1234/test".to_string());
        let resolved = source.resolve_identifier(&ids);
        assert!(resolved
            .get(&IdentifierType::Bibcode)
            .is_some_and(|b| b.contains("doi:")));

        let mut arxiv = IdentifierMap::new();
        arxiv.insert(IdentifierType::Arxiv, "2301.12345".to_string());
        let resolved = source.resolve_identifier(&arxiv);
        assert!(resolved
            .get(&IdentifierType::Bibcode)
            .is_some_and(|b| b.contains("arXiv:")));
    }

    #[tokio::test]
    async fn test_enrich_without_api_key_requires_auth() {
        let source = AdsSource::new(None);
        let mut ids = IdentifierMap::new();
        ids.insert(IdentifierType::Doi, "10.1234/test".to_string());

        let err = source.enrich(&ids, None).await.unwrap_err();
        assert_eq!(
            err,
            EnrichmentError::AuthenticationRequired {
                source_id: "ads".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_enrich_without_identifiers_fails() {
        let source = AdsSource::new(Some("key".to_string()));
        let err = source.enrich(&IdentifierMap::new(), None).await.unwrap_err();
        assert_eq!(err, EnrichmentError::NoIdentifier);
    }

    #[test]
    fn test_supports_capabilities() {
        let source = AdsSource::default();
        assert!(source.supports(EnrichmentCapability::CitationCount));
        assert!(source.supports(EnrichmentCapability::Abstract));
        assert!(!source.supports(EnrichmentCapability::AuthorStats));
    }
}
