//! Mock collaborators for testing the resolver.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::models::{ArticleMetadata, CitationWork};
use crate::sources::{CitationSource, DirectSource, MetadataSource, SourceError};

type DirectReply = Result<Option<String>, String>;
type CitationReply = Result<Vec<CitationWork>, String>;

/// Scriptable direct-resolution double.
///
/// Replies are consumed in order; once the script is exhausted the last
/// configured behavior repeats. Calls are counted for short-circuit and
/// retry assertions.
#[derive(Debug, Default)]
pub struct MockDirect {
    script: Mutex<VecDeque<DirectReply>>,
    repeat: Mutex<Option<DirectReply>>,
    calls: AtomicU32,
}

impl MockDirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return the given URL
    pub fn returning_url(url: &str) -> Self {
        let mock = Self::new();
        *mock.repeat.lock().unwrap() = Some(Ok(Some(url.to_string())));
        mock
    }

    /// Always return no URL
    pub fn returning_empty() -> Self {
        let mock = Self::new();
        *mock.repeat.lock().unwrap() = Some(Ok(None));
        mock
    }

    /// Always fail with the given message
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        *mock.repeat.lock().unwrap() = Some(Err(message.to_string()));
        mock
    }

    /// Queue a one-shot reply ahead of the repeating behavior
    pub fn push(&self, reply: DirectReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> DirectReply {
        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return reply;
        }
        self.repeat.lock().unwrap().clone().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl DirectSource for MockDirect {
    fn id(&self) -> &str {
        "mock-direct"
    }

    async fn full_text_url(&self, _pmid: &str) -> Result<Option<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_reply().map_err(SourceError::Other)
    }
}

/// Scriptable metadata double with a single canned article.
#[derive(Debug, Default)]
pub struct MockMetadata {
    article: Mutex<Option<ArticleMetadata>>,
    error: Mutex<Option<String>>,
    calls: AtomicU32,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return the given article
    pub fn returning(article: ArticleMetadata) -> Self {
        let mock = Self::new();
        *mock.article.lock().unwrap() = Some(article);
        mock
    }

    /// Always fail with the given message
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        *mock.error.lock().unwrap() = Some(message.to_string());
        mock
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for MockMetadata {
    fn id(&self) -> &str {
        "mock-metadata"
    }

    async fn article_by_pmid(&self, pmid: &str) -> Result<ArticleMetadata, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(SourceError::Other(message));
        }
        self.article
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::NotFound(format!("No record for {}", pmid)))
    }

    async fn pmids_for_query(
        &self,
        _term: &str,
        _retmax: usize,
    ) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(SourceError::Other(message));
        }
        Ok(self
            .article
            .lock()
            .unwrap()
            .as_ref()
            .map(|a| vec![a.pmid.clone()])
            .unwrap_or_default())
    }
}

/// Scriptable citation-search double.
#[derive(Debug, Default)]
pub struct MockCitations {
    script: Mutex<VecDeque<CitationReply>>,
    repeat: Mutex<Option<CitationReply>>,
    calls: AtomicU32,
}

impl MockCitations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return the given works
    pub fn returning(works: Vec<CitationWork>) -> Self {
        let mock = Self::new();
        *mock.repeat.lock().unwrap() = Some(Ok(works));
        mock
    }

    /// Always fail with the given message
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        *mock.repeat.lock().unwrap() = Some(Err(message.to_string()));
        mock
    }

    /// Queue a one-shot reply ahead of the repeating behavior
    pub fn push(&self, reply: CitationReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> CitationReply {
        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return reply;
        }
        self.repeat.lock().unwrap().clone().unwrap_or(Ok(Vec::new()))
    }
}

#[async_trait]
impl CitationSource for MockCitations {
    fn id(&self) -> &str {
        "mock-citations"
    }

    async fn works_by_bibliographic(
        &self,
        _title: &str,
        _journal: &str,
        _limit: usize,
    ) -> Result<Vec<CitationWork>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_reply().map_err(SourceError::Other)
    }
}

/// Helper to create a canned article for tests.
pub fn make_article(pmid: &str, title: &str, journal: &str) -> ArticleMetadata {
    crate::models::ArticleBuilder::new(pmid, title)
        .journal(journal)
        .build()
}
