//! Document translation using a pretrained Marian sequence-to-sequence
//! model run locally.
//!
//! The supported target-language set is fixed; validation happens before
//! any file I/O. Input text is split into fixed-size chunks translated
//! sequentially, outputs joined with newlines.

mod document;
mod marian;

pub use document::read_document;
pub use marian::MarianTranslator;

use std::path::Path;

/// Maximum characters per translation chunk
const MAX_CHUNK_CHARS: usize = 512;

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
    Russian,
    Chinese,
    Japanese,
    Korean,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::French,
        Language::German,
        Language::Spanish,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
    ];

    /// ISO-639-1 style code used in model names and on the CLI
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
        }
    }

    /// Look up a language by code
    pub fn from_code(code: &str) -> Option<Language> {
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }

    /// Display list of supported names, for error messages
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|l| l.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Errors raised by the translation pipeline
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Target language is not in the supported set
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    /// Input file has an extension without a reader
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Input file could not be read
    #[error("Error reading file: {0}")]
    Read(String),

    /// Model download, load, or inference failure
    #[error("Translation error: {0}")]
    Model(String),
}

impl From<candle_core::Error> for TranslateError {
    fn from(err: candle_core::Error) -> Self {
        TranslateError::Model(err.to_string())
    }
}

/// Read a document and translate its text to the target language.
///
/// Blocking: loads the model on first use and runs inference on the
/// current thread.
pub fn translate_file(path: &Path, target: Language) -> Result<String, TranslateError> {
    let content = read_document(path)?;
    let mut translator = MarianTranslator::load(target)?;
    translator.translate(&content)
}

/// Split text into chunks of at most `max_chars` characters, preserving
/// order and char boundaries
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}
