//! Lookup clients and the trait seams the resolver depends on.
//!
//! This module defines the collaborator traits the [`crate::resolver`]
//! works against:
//!
//! - [`DirectSource`]: maps an identifier straight to a full-text URL using
//!   provider-specific heuristics
//! - [`MetadataSource`]: bibliographic metadata lookup and search over the
//!   citation database
//! - [`CitationSource`]: bibliographic search with per-record link
//!   extraction in a secondary citation index
//!
//! Concrete clients live in the submodules; [`mock`] provides scriptable
//! doubles for tests.

mod crossref;
mod pmc;
mod pubmed;

pub mod mock;

pub use crossref::CrossRefClient;
pub use pmc::PmcClient;
pub use pubmed::PubMedClient;

use crate::models::{ArticleMetadata, CitationWork};
use async_trait::async_trait;

/// Maps an identifier straight to a provider full-text URL.
#[async_trait]
pub trait DirectSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in log lines)
    fn id(&self) -> &str;

    /// Attempt a direct full-text URL lookup for the identifier.
    ///
    /// `Ok(None)` means the provider has no full text for this article;
    /// errors are reserved for lookup faults.
    async fn full_text_url(&self, pmid: &str) -> Result<Option<String>, SourceError>;
}

/// Bibliographic metadata lookup and search.
#[async_trait]
pub trait MetadataSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in log lines)
    fn id(&self) -> &str;

    /// Fetch the metadata record for a single identifier
    async fn article_by_pmid(&self, pmid: &str) -> Result<ArticleMetadata, SourceError>;

    /// Search the citation database, returning identifiers in rank order
    async fn pmids_for_query(&self, term: &str, retmax: usize)
        -> Result<Vec<String>, SourceError>;
}

/// Bibliographic search with per-record link extraction.
#[async_trait]
pub trait CitationSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in log lines)
    fn id(&self) -> &str;

    /// Search by title and container title, returning at most `limit`
    /// records with their link lists in service order
    async fn works_by_bibliographic(
        &self,
        title: &str,
        journal: &str,
        limit: usize,
    ) -> Result<Vec<CitationWork>, SourceError>;
}

/// Errors that can occur when interacting with a lookup service
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// API error from the service
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
