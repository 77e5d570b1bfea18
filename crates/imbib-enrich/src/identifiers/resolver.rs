//! Identifier resolution across enrichment sources
//!
//! Maps identifiers between different systems (DOI→S2, arXiv→OpenAlex) and
//! determines which identifiers can be used with which sources. Resolutions
//! are cached per input set, bounded by `max_cache_size`.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

use crate::domain::identifiers::{IdentifierMap, IdentifierType, SourceId};

/// Default bound for the resolution cache
pub const DEFAULT_MAX_CACHE_SIZE: usize = 256;

/// Derive the Semantic Scholar lookup form of a DOI
pub fn resolve_doi_to_semantic_scholar(doi: &str) -> String {
    format!("DOI:{}", doi)
}

/// Derive the Semantic Scholar lookup form of an arXiv ID
pub fn resolve_arxiv_to_semantic_scholar(arxiv_id: &str) -> String {
    format!("ARXIV:{}", arxiv_id)
}

/// Derive the Semantic Scholar lookup form of a PubMed ID
pub fn resolve_pmid_to_semantic_scholar(pmid: &str) -> String {
    format!("PMID:{}", pmid)
}

/// Identifier types a source accepts as query input, most preferred first
pub fn accepted_identifiers(source: SourceId) -> &'static [IdentifierType] {
    match source {
        // ADS prefers bibcode, then DOI, then arXiv
        SourceId::Ads => &[
            IdentifierType::Bibcode,
            IdentifierType::Doi,
            IdentifierType::Arxiv,
        ],
        // S2 prefers its own ID, then DOI, arXiv, PMID
        SourceId::SemanticScholar => &[
            IdentifierType::SemanticScholar,
            IdentifierType::Doi,
            IdentifierType::Arxiv,
            IdentifierType::Pmid,
        ],
    }
}

/// Whether the identifier set contains at least one type `source` accepts
pub fn can_resolve(identifiers: &IdentifierMap, source: SourceId) -> bool {
    accepted_identifiers(source)
        .iter()
        .any(|id_type| identifiers.contains_key(id_type))
}

/// The single best identifier for querying `source`, by its preference order
pub fn preferred_identifier(
    identifiers: &IdentifierMap,
    source: SourceId,
) -> Option<(IdentifierType, String)> {
    for id_type in accepted_identifiers(source) {
        if let Some(value) = identifiers.get(id_type) {
            return Some((*id_type, value.clone()));
        }
    }
    None
}

// Cache key: the input map with a deterministic order, so value-equal inputs
// hit the same entry.
type CacheKey = Vec<(IdentifierType, String)>;

fn cache_key(identifiers: &IdentifierMap) -> CacheKey {
    let mut key: CacheKey = identifiers
        .iter()
        .map(|(k, v)| (*k, v.clone()))
        .collect();
    key.sort();
    key
}

struct ResolverInner {
    cache: HashMap<CacheKey, IdentifierMap>,
    insertion_order: VecDeque<CacheKey>,
}

/// Translates between bibliographic identifier schemes, with a bounded cache
pub struct IdentifierResolver {
    max_cache_size: usize,
    inner: Mutex<ResolverInner>,
}

impl IdentifierResolver {
    pub fn new() -> Self {
        Self::with_max_cache_size(DEFAULT_MAX_CACHE_SIZE)
    }

    pub fn with_max_cache_size(max_cache_size: usize) -> Self {
        Self {
            max_cache_size: max_cache_size.max(1),
            inner: Mutex::new(ResolverInner {
                cache: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    /// Resolve an identifier set to a strict superset with derived identifiers.
    ///
    /// Existing keys are never overwritten; an empty input yields an empty
    /// output. Identical inputs are served from the cache.
    pub async fn resolve(&self, identifiers: &IdentifierMap) -> IdentifierMap {
        let key = cache_key(identifiers);
        let mut inner = self.inner.lock().await;

        if let Some(hit) = inner.cache.get(&key) {
            return hit.clone();
        }

        let resolved = derive_identifiers(identifiers);

        inner.insertion_order.push_back(key.clone());
        inner.cache.insert(key, resolved.clone());
        while inner.cache.len() > self.max_cache_size {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.cache.remove(&oldest);
            }
        }

        resolved
    }

    /// Current number of cached resolutions
    pub async fn cache_size(&self) -> usize {
        self.inner.lock().await.cache.len()
    }

    /// Drop all cached resolutions
    pub async fn clear_cache(&self) {
        let mut inner = self.inner.lock().await;
        inner.cache.clear();
        inner.insertion_order.clear();
    }
}

impl Default for IdentifierResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_identifiers(identifiers: &IdentifierMap) -> IdentifierMap {
    let mut resolved = identifiers.clone();
    if resolved.is_empty() {
        return resolved;
    }

    if !resolved.contains_key(&IdentifierType::SemanticScholar) {
        if let Some(doi) = resolved.get(&IdentifierType::Doi) {
            resolved.insert(
                IdentifierType::SemanticScholar,
                resolve_doi_to_semantic_scholar(doi),
            );
        } else if let Some(arxiv) = resolved.get(&IdentifierType::Arxiv) {
            resolved.insert(
                IdentifierType::SemanticScholar,
                resolve_arxiv_to_semantic_scholar(arxiv),
            );
        } else if let Some(pmid) = resolved.get(&IdentifierType::Pmid) {
            resolved.insert(
                IdentifierType::SemanticScholar,
                resolve_pmid_to_semantic_scholar(pmid),
            );
        }
    }

    if !resolved.contains_key(&IdentifierType::OpenAlex) {
        let openalex = if let Some(doi) = resolved.get(&IdentifierType::Doi) {
            Some(format!("doi:{}", doi))
        } else {
            resolved
                .get(&IdentifierType::Arxiv)
                .map(|arxiv| format!("arxiv:{}", arxiv))
        };
        if let Some(value) = openalex {
            resolved.insert(IdentifierType::OpenAlex, value);
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pairs: &[(IdentifierType, &str)]) -> IdentifierMap {
        pairs
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_resolve_doi_derives_semantic_scholar() {
        let resolver = IdentifierResolver::new();
        let input = ids(&[(IdentifierType::Doi, "10.1234/test")]);
        let resolved = resolver.resolve(&input).await;
        assert_eq!(
            resolved.get(&IdentifierType::SemanticScholar).map(String::as_str),
            Some("DOI:10.1234/test")
        );
        // Input keys survive untouched
        assert_eq!(
            resolved.get(&IdentifierType::Doi).map(String::as_str),
            Some("10.1234/test")
        );
    }

    #[tokio::test]
    async fn test_resolve_arxiv_derives_semantic_scholar() {
        let resolver = IdentifierResolver::new();
        let resolved = resolver
            .resolve(&ids(&[(IdentifierType::Arxiv, "2301.12345")]))
            .await;
        assert_eq!(
            resolved.get(&IdentifierType::SemanticScholar).map(String::as_str),
            Some("ARXIV:2301.12345")
        );
    }

    #[tokio::test]
    async fn test_resolve_never_overwrites_existing_keys() {
        let resolver = IdentifierResolver::new();
        let input = ids(&[
            (IdentifierType::Doi, "10.1234/test"),
            (IdentifierType::SemanticScholar, "abc123"),
        ]);
        let resolved = resolver.resolve(&input).await;
        assert_eq!(
            resolved.get(&IdentifierType::SemanticScholar).map(String::as_str),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn test_resolve_derives_openalex_from_doi() {
        let resolver = IdentifierResolver::new();
        let resolved = resolver
            .resolve(&ids(&[(IdentifierType::Doi, "10.1234/test")]))
            .await;
        assert!(resolved.contains_key(&IdentifierType::OpenAlex));
    }

    #[tokio::test]
    async fn test_resolve_empty_input_is_empty() {
        let resolver = IdentifierResolver::new();
        let resolved = resolver.resolve(&IdentifierMap::new()).await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_does_not_grow_cache() {
        let resolver = IdentifierResolver::new();
        let input = ids(&[(IdentifierType::Doi, "10.1234/test")]);

        let first = resolver.resolve(&input).await;
        assert_eq!(resolver.cache_size().await, 1);

        let second = resolver.resolve(&input).await;
        assert_eq!(resolver.cache_size().await, 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_evicts_oldest_beyond_bound() {
        let resolver = IdentifierResolver::with_max_cache_size(3);
        for i in 0..10 {
            let input = ids(&[(IdentifierType::Doi, &format!("10.1234/test-{}", i))]);
            resolver.resolve(&input).await;
        }
        assert!(resolver.cache_size().await <= 3);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let resolver = IdentifierResolver::new();
        resolver
            .resolve(&ids(&[(IdentifierType::Doi, "10.1234/test")]))
            .await;
        resolver.clear_cache().await;
        assert_eq!(resolver.cache_size().await, 0);
    }

    #[test]
    fn test_can_resolve_to_ads() {
        assert!(can_resolve(
            &ids(&[(IdentifierType::Bibcode, "2020ApJ...123...45A")]),
            SourceId::Ads
        ));
        assert!(can_resolve(
            &ids(&[(IdentifierType::Doi, "10.1234/test")]),
            SourceId::Ads
        ));
        assert!(can_resolve(
            &ids(&[(IdentifierType::Arxiv, "2301.12345")]),
            SourceId::Ads
        ));
        assert!(!can_resolve(
            &ids(&[(IdentifierType::SemanticScholar, "abc123")]),
            SourceId::Ads
        ));
        assert!(!can_resolve(&IdentifierMap::new(), SourceId::Ads));
    }

    #[test]
    fn test_can_resolve_to_semantic_scholar() {
        assert!(can_resolve(
            &ids(&[(IdentifierType::Pmid, "12345678")]),
            SourceId::SemanticScholar
        ));
        assert!(!can_resolve(
            &ids(&[(IdentifierType::Bibcode, "2020ApJ...123...45A")]),
            SourceId::SemanticScholar
        ));
    }

    #[test]
    fn test_preferred_identifier_for_ads() {
        // Bibcode is most preferred
        let result = preferred_identifier(
            &ids(&[
                (IdentifierType::Bibcode, "2020ApJ...123...45A"),
                (IdentifierType::Doi, "10.1234/test"),
            ]),
            SourceId::Ads,
        );
        assert_eq!(
            result,
            Some((IdentifierType::Bibcode, "2020ApJ...123...45A".to_string()))
        );

        // DOI is second choice
        let result = preferred_identifier(
            &ids(&[
                (IdentifierType::Doi, "10.1234/test"),
                (IdentifierType::Arxiv, "2301.12345"),
            ]),
            SourceId::Ads,
        );
        assert_eq!(result, Some((IdentifierType::Doi, "10.1234/test".to_string())));
    }

    #[test]
    fn test_preferred_identifier_none() {
        assert_eq!(preferred_identifier(&IdentifierMap::new(), SourceId::Ads), None);
    }

    #[test]
    fn test_resolve_to_semantic_scholar_forms() {
        assert_eq!(
            resolve_doi_to_semantic_scholar("10.1234/test"),
            "DOI:10.1234/test"
        );
        assert_eq!(
            resolve_arxiv_to_semantic_scholar("2301.12345"),
            "ARXIV:2301.12345"
        );
        assert_eq!(resolve_pmid_to_semantic_scholar("12345678"), "PMID:12345678");
    }
}
