//! Core data models for articles and resolution outcomes.

mod article;
mod resolve;

pub use article::{ArticleBuilder, ArticleMetadata};
pub use resolve::{CandidateLink, CitationWork, DownloadOutcome, Resolution};
