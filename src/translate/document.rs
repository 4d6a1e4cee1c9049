//! Readers for the supported input document formats.

use std::path::Path;

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

use super::TranslateError;

/// Read the text content of a `.txt`, `.pdf`, `.doc`, or `.docx` file.
pub fn read_document(path: &Path) -> Result<String, TranslateError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" => {
            std::fs::read_to_string(path).map_err(|e| TranslateError::Read(e.to_string()))
        }
        "pdf" => read_pdf(path),
        "doc" | "docx" => read_docx_file(path),
        other => Err(TranslateError::UnsupportedFileType(format!(".{}", other))),
    }
}

/// Extract text from a PDF.
///
/// Requires the native poppler libraries pdf-extract links against.
fn read_pdf(path: &Path) -> Result<String, TranslateError> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| TranslateError::Read(format!("PDF extraction failed: {}", e)))?;
    if text.trim().is_empty() {
        // Scanned or image-only PDFs extract to nothing.
        tracing::debug!(path = %path.display(), "extracted empty text from PDF");
    }
    Ok(text)
}

/// Extract paragraph text from a Word document, one line per paragraph.
fn read_docx_file(path: &Path) -> Result<String, TranslateError> {
    let buf = std::fs::read(path).map_err(|e| TranslateError::Read(e.to_string()))?;
    let docx =
        read_docx(&buf).map_err(|e| TranslateError::Read(format!("DOCX parse failed: {}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => {
                let text: String = p
                    .children
                    .iter()
                    .filter_map(|pc| match pc {
                        ParagraphChild::Run(run) => Some(
                            run.children
                                .iter()
                                .filter_map(|rc| match rc {
                                    RunChild::Text(t) => Some(t.text.clone()),
                                    _ => None,
                                })
                                .collect::<String>(),
                        ),
                        _ => None,
                    })
                    .collect();
                Some(text)
            }
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_txt() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "hello world").unwrap();

        let text = read_document(file.path()).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_document(Path::new("notes.md")).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedFileType(_)));
        assert!(err.to_string().contains(".md"));
    }

    #[test]
    fn test_extension_case_insensitive() {
        let err = read_document(Path::new("missing.TXT")).unwrap_err();
        // Reaches the txt reader (and fails on the missing file), rather
        // than being rejected as an unsupported type.
        assert!(matches!(err, TranslateError::Read(_)));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let err = read_document(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert!(matches!(err, TranslateError::Read(_)));
    }
}
