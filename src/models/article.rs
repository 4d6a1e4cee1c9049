//! Article model representing a PubMed record.

use serde::{Deserialize, Serialize};

/// Bibliographic metadata for a single PubMed article
///
/// Produced by the PubMed metadata client; read-only to the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMetadata {
    /// PubMed identifier
    pub pmid: String,

    /// Article title
    pub title: String,

    /// Journal title
    pub journal: String,

    /// Authors in document order
    pub authors: Vec<String>,

    /// Publication year
    pub year: Option<i32>,

    /// Abstract text (sections joined with spaces)
    pub abstract_text: String,

    /// Digital Object Identifier, when the record carries one
    pub doi: Option<String>,
}

impl ArticleMetadata {
    /// Create a new article with required fields
    pub fn new(pmid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            pmid: pmid.into(),
            title: title.into(),
            journal: String::new(),
            authors: Vec::new(),
            year: None,
            abstract_text: String::new(),
            doi: None,
        }
    }

    /// Authors joined for display
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

/// Builder for constructing ArticleMetadata
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    article: ArticleMetadata,
}

impl ArticleBuilder {
    /// Create a new builder with required fields
    pub fn new(pmid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            article: ArticleMetadata::new(pmid, title),
        }
    }

    /// Set journal title
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.article.journal = journal.into();
        self
    }

    /// Set authors
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.article.authors = authors;
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.article.year = Some(year);
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.article.abstract_text = abstract_text.into();
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.article.doi = Some(doi.into());
        self
    }

    /// Build the ArticleMetadata
    pub fn build(self) -> ArticleMetadata {
        self.article
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_builder() {
        let article = ArticleBuilder::new("12345", "A Test Article")
            .journal("Journal of Clinical Oncology")
            .authors(vec!["Jane Smith".to_string(), "John Doe".to_string()])
            .year(2020)
            .abstract_text("Background: a test.")
            .doi("10.1234/test.1234")
            .build();

        assert_eq!(article.pmid, "12345");
        assert_eq!(article.title, "A Test Article");
        assert_eq!(article.journal, "Journal of Clinical Oncology");
        assert_eq!(article.year, Some(2020));
        assert_eq!(article.doi, Some("10.1234/test.1234".to_string()));
    }

    #[test]
    fn test_author_line_preserves_order() {
        let article = ArticleBuilder::new("1", "T")
            .authors(vec![
                "First Author".to_string(),
                "Second Author".to_string(),
            ])
            .build();

        assert_eq!(article.author_line(), "First Author, Second Author");
    }
}
