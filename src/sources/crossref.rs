//! CrossRef citation metadata client.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CandidateLink, CitationWork};
use crate::sources::{CitationSource, SourceError};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef citation metadata client
///
/// Uses the CrossRef REST API's bibliographic query to find candidate DOI
/// and link records for an article known only by title and journal.
#[derive(Debug, Clone)]
pub struct CrossRefClient {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefClient {
    pub fn new() -> Result<Self, SourceError> {
        let user_agent = format!(
            "{}/{} (mailto:crossref@crossref.org)",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        Ok(Self {
            client: Arc::new(HttpClient::with_user_agent(&user_agent)?),
            base_url: CROSSREF_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API base (for testing)
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_works_url(&self, title: &str, journal: &str, limit: usize) -> String {
        format!(
            "{}/works?query.bibliographic={}&query.container-title={}&rows={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(journal),
            limit
        )
    }

    fn parse_works(data: CRResponse) -> Vec<CitationWork> {
        data.message
            .items
            .into_iter()
            .map(|item| {
                let links = item
                    .link
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|l| {
                        l.url.map(|url| CandidateLink::new(url, l.content_type))
                    })
                    .collect();

                CitationWork {
                    doi: item.doi,
                    links,
                }
            })
            .collect()
    }
}

#[async_trait]
impl CitationSource for CrossRefClient {
    fn id(&self) -> &str {
        "crossref"
    }

    async fn works_by_bibliographic(
        &self,
        title: &str,
        journal: &str,
        limit: usize,
    ) -> Result<Vec<CitationWork>, SourceError> {
        if title.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "Empty title for bibliographic search".to_string(),
            ));
        }

        let url = self.build_works_url(title, journal, limit);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search CrossRef: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "CrossRef API returned status: {}",
                response.status()
            )));
        }

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse CrossRef JSON: {}", e)))?;

        Ok(Self::parse_works(data))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRWork>,
}

#[derive(Debug, Deserialize)]
struct CRWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    link: Option<Vec<CRLink>>,
}

#[derive(Debug, Deserialize)]
struct CRLink {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}
