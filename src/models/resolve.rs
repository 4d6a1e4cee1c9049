//! Resolution and download outcome models.

use serde::{Deserialize, Serialize};

/// One entry from a citation record's link list
///
/// Ordering as returned by the citation service is preserved; the resolver
/// only reads and selects, never reorders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Link target
    pub url: String,

    /// Declared content type, when the record carries one
    pub content_type: Option<String>,
}

impl CandidateLink {
    /// Create a new candidate link
    pub fn new(url: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            url: url.into(),
            content_type,
        }
    }

    /// Whether this link points at a PDF, by declared type or URL suffix
    pub fn is_pdf(&self) -> bool {
        if self.content_type.as_deref() == Some("application/pdf") {
            return true;
        }
        self.url.to_lowercase().ends_with(".pdf")
    }
}

/// One result record from a bibliographic search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationWork {
    /// DOI of the record, when present
    pub doi: Option<String>,

    /// Full-text links in service order
    pub links: Vec<CandidateLink>,
}

/// Outcome of resolving an identifier to a full-text location
///
/// Computed fresh per call; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A usable URL was found
    Found { url: String, doi: Option<String> },

    /// Metadata (a DOI) was found but no full-text link
    MetadataOnly { doi: String },

    /// Nothing usable was found
    NotFound,
}

impl Resolution {
    /// The resolved URL, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolution::Found { url, .. } => Some(url),
            _ => None,
        }
    }

    /// The DOI carried by the outcome, if any
    pub fn doi(&self) -> Option<&str> {
        match self {
            Resolution::Found { doi, .. } => doi.as_deref(),
            Resolution::MetadataOnly { doi } => Some(doi),
            Resolution::NotFound => None,
        }
    }
}

/// Result of a download operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// Path where the file was saved
    pub path: String,

    /// Number of bytes written
    pub bytes: u64,

    /// Whether the download was successful
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,
}

impl DownloadOutcome {
    /// Create a successful outcome
    pub fn success(path: impl Into<String>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            bytes,
            success: true,
            error: None,
        }
    }

    /// Create a failed outcome
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            bytes: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_by_content_type() {
        let link = CandidateLink::new("https://example.org/x", Some("application/pdf".into()));
        assert!(link.is_pdf());
    }

    #[test]
    fn test_is_pdf_by_suffix_case_insensitive() {
        let link = CandidateLink::new("https://example.org/paper.PDF", None);
        assert!(link.is_pdf());

        let html = CandidateLink::new("https://example.org/paper.html", Some("text/html".into()));
        assert!(!html.is_pdf());
    }

    #[test]
    fn test_resolution_accessors() {
        let found = Resolution::Found {
            url: "https://example.org/a.pdf".to_string(),
            doi: Some("10.1/x".to_string()),
        };
        assert_eq!(found.url(), Some("https://example.org/a.pdf"));
        assert_eq!(found.doi(), Some("10.1/x"));

        let meta = Resolution::MetadataOnly {
            doi: "10.1/y".to_string(),
        };
        assert_eq!(meta.url(), None);
        assert_eq!(meta.doi(), Some("10.1/y"));

        assert_eq!(Resolution::NotFound.url(), None);
        assert_eq!(Resolution::NotFound.doi(), None);
    }

    #[test]
    fn test_download_outcome() {
        let ok = DownloadOutcome::success("/tmp/1.pdf", 10);
        assert!(ok.success);
        assert_eq!(ok.bytes, 10);

        let failed = DownloadOutcome::error("status 403");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("status 403"));
    }
}
