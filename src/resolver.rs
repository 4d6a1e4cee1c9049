//! Article source resolver: maps an identifier to a best-effort full-text
//! URL, trying multiple resolution strategies in priority order with
//! bounded retries.
//!
//! Strategy order:
//!
//! 1. Direct path: a provider-specific full-text lookup by identifier.
//! 2. Metadata path: fetch the article's bibliographic record, run a
//!    bounded bibliographic search in the citation index, and select a
//!    link from the first matching record (PDF-typed links win, else the
//!    first link).
//!
//! If neither path produces a URL the whole sequence is retried with a
//! linearly increasing backoff. Collaborator failures are converted into
//! attempt failures; the resolver itself never returns an error.

use std::sync::Arc;
use tokio::time::sleep;

use crate::models::{CandidateLink, Resolution};
use crate::sources::{CitationSource, DirectSource, MetadataSource, SourceError};
use crate::utils::RetryPolicy;

/// Result limit for the bibliographic search
const BIBLIO_RESULT_LIMIT: usize = 5;

/// Resolves an article identifier to a downloadable full-text URL
#[derive(Debug, Clone)]
pub struct ArticleSourceResolver {
    direct: Arc<dyn DirectSource>,
    metadata: Arc<dyn MetadataSource>,
    citations: Arc<dyn CitationSource>,
    policy: RetryPolicy,
}

impl ArticleSourceResolver {
    /// Create a resolver over the given collaborators with the default
    /// retry policy
    pub fn new(
        direct: Arc<dyn DirectSource>,
        metadata: Arc<dyn MetadataSource>,
        citations: Arc<dyn CitationSource>,
    ) -> Self {
        Self {
            direct,
            metadata,
            citations,
            policy: RetryPolicy::default(),
        }
    }

    /// Override the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve an identifier to a full-text location.
    ///
    /// Never returns an error: collaborator failures fail the attempt and
    /// the loop retries up to the policy bound, sleeping
    /// `base_delay * attempt` between attempts.
    pub async fn resolve(&self, pmid: &str) -> Resolution {
        let mut best = Resolution::NotFound;

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(pmid).await {
                Ok(Resolution::Found { url, doi }) => {
                    tracing::info!(pmid, url = %url, "resolved full-text URL");
                    return Resolution::Found { url, doi };
                }
                Ok(Resolution::MetadataOnly { doi }) => {
                    tracing::info!(pmid, doi = %doi, "found metadata, no full-text link");
                    best = Resolution::MetadataOnly { doi };
                }
                Ok(Resolution::NotFound) => {
                    tracing::debug!(pmid, attempt, "no source produced a URL");
                }
                Err(e) => {
                    if self.policy.has_next(attempt) {
                        tracing::warn!(pmid, attempt, error = %e, "resolution attempt failed");
                    } else {
                        tracing::error!(
                            pmid,
                            attempts = self.policy.max_attempts,
                            error = %e,
                            "giving up on full-text resolution"
                        );
                    }
                }
            }

            if self.policy.has_next(attempt) {
                let delay = self.policy.delay_for(attempt);
                tracing::debug!(pmid, attempt, ?delay, "backing off before retry");
                sleep(delay).await;
            }
        }

        best
    }

    /// One pass over both strategies
    async fn attempt(&self, pmid: &str) -> Result<Resolution, SourceError> {
        if let Some(url) = self.direct.full_text_url(pmid).await? {
            if !url.is_empty() {
                tracing::debug!(pmid, source = self.direct.id(), "direct path hit");
                return Ok(Resolution::Found { url, doi: None });
            }
        }

        let article = self.metadata.article_by_pmid(pmid).await?;
        let works = self
            .citations
            .works_by_bibliographic(&article.title, &article.journal, BIBLIO_RESULT_LIMIT)
            .await?;

        let work = match works.into_iter().next() {
            Some(w) => w,
            None => return Ok(Resolution::NotFound),
        };

        if let Some(doi) = &work.doi {
            tracing::debug!(pmid, source = self.citations.id(), doi = %doi, "bibliographic match");
        }

        match (Self::select_link(&work.links), work.doi) {
            (Some(link), doi) => Ok(Resolution::Found {
                url: link.url.clone(),
                doi,
            }),
            (None, Some(doi)) => Ok(Resolution::MetadataOnly { doi }),
            (None, None) => Ok(Resolution::NotFound),
        }
    }

    /// First PDF-typed link, else the first link at all
    fn select_link(links: &[CandidateLink]) -> Option<&CandidateLink> {
        links.iter().find(|l| l.is_pdf()).or_else(|| links.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CitationWork;
    use crate::sources::mock::{make_article, MockCitations, MockDirect, MockMetadata};
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(0))
    }

    fn resolver(
        direct: MockDirect,
        metadata: MockMetadata,
        citations: MockCitations,
    ) -> ArticleSourceResolver {
        ArticleSourceResolver::new(Arc::new(direct), Arc::new(metadata), Arc::new(citations))
            .with_policy(fast_policy())
    }

    #[test]
    fn test_select_link_prefers_pdf_anywhere_in_list() {
        let links = vec![
            CandidateLink::new("https://example.org/a.html", Some("text/html".into())),
            CandidateLink::new("https://example.org/b.pdf", Some("application/pdf".into())),
        ];
        let selected = ArticleSourceResolver::select_link(&links).unwrap();
        assert_eq!(selected.url, "https://example.org/b.pdf");
    }

    #[test]
    fn test_select_link_falls_back_to_first() {
        let links = vec![
            CandidateLink::new("https://example.org/a.html", Some("text/html".into())),
            CandidateLink::new("https://example.org/b.html", Some("text/html".into())),
        ];
        let selected = ArticleSourceResolver::select_link(&links).unwrap();
        assert_eq!(selected.url, "https://example.org/a.html");
    }

    #[test]
    fn test_select_link_empty() {
        assert!(ArticleSourceResolver::select_link(&[]).is_none());
    }

    #[tokio::test]
    async fn test_direct_path_short_circuits() {
        let direct = MockDirect::returning_url("https://example.org/12345.pdf");
        let metadata = MockMetadata::returning(make_article("12345", "T", "J"));
        let citations = MockCitations::returning(vec![]);

        let metadata_handle = Arc::new(metadata);
        let citations_handle = Arc::new(citations);
        let resolver = ArticleSourceResolver::new(
            Arc::new(direct),
            Arc::clone(&metadata_handle) as Arc<dyn MetadataSource>,
            Arc::clone(&citations_handle) as Arc<dyn CitationSource>,
        )
        .with_policy(fast_policy());

        let resolution = resolver.resolve("12345").await;

        assert_eq!(resolution.url(), Some("https://example.org/12345.pdf"));
        assert_eq!(metadata_handle.calls(), 0);
        assert_eq!(citations_handle.calls(), 0);
    }

    #[tokio::test]
    async fn test_metadata_only_outcome_survives_retries() {
        let direct = MockDirect::returning_empty();
        let metadata = MockMetadata::returning(make_article("7", "T", "J"));
        let citations = MockCitations::returning(vec![CitationWork {
            doi: Some("10.1/doi-only".to_string()),
            links: vec![],
        }]);

        let resolution = resolver(direct, metadata, citations).resolve("7").await;

        assert_eq!(
            resolution,
            Resolution::MetadataOnly {
                doi: "10.1/doi-only".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_collaborator_error_does_not_escape() {
        let direct = MockDirect::failing("connection refused");
        let metadata = MockMetadata::returning(make_article("8", "T", "J"));
        let citations = MockCitations::returning(vec![]);

        let resolution = resolver(direct, metadata, citations).resolve("8").await;
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let direct = MockDirect::returning_empty();
        direct.push(Err("timeout".to_string()));
        direct.push(Ok(Some("https://example.org/late.pdf".to_string())));
        let metadata = MockMetadata::returning(make_article("9", "T", "J"));
        let citations = MockCitations::returning(vec![]);

        let resolution = resolver(direct, metadata, citations).resolve("9").await;
        assert_eq!(resolution.url(), Some("https://example.org/late.pdf"));
    }
}
