//! Download executor: fetches a resolved URL and persists the PDF.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::DownloadOutcome;
use crate::sources::SourceError;
use crate::utils::HttpClient;

/// Fetches resolved URLs and writes them under a target directory
#[derive(Debug, Clone)]
pub struct DownloadExecutor {
    client: Arc<HttpClient>,
}

impl DownloadExecutor {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
        })
    }

    /// Create with a custom HTTP client (for testing)
    #[allow(dead_code)]
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Fetch `url` and write it to `<dir>/<pmid>.pdf`.
    ///
    /// Creates the directory if absent. Reports failure through the
    /// outcome value; the caller decides whether to try the browser
    /// fallback.
    pub async fn fetch_to_dir(&self, url: &str, dir: &Path, pmid: &str) -> DownloadOutcome {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(pmid, url, error = %e, "download request failed");
                return DownloadOutcome::error(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        tracing::info!(pmid, url, %status, "download response");
        if status != reqwest::StatusCode::OK {
            return DownloadOutcome::error(format!("status {}", status));
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(pmid, url, error = %e, "failed to read download body");
                return DownloadOutcome::error(format!("body read failed: {}", e));
            }
        };

        match Self::write_pdf(dir, pmid, &bytes).await {
            Ok(path) => {
                tracing::info!(pmid, path = %path.display(), bytes = bytes.len(), "saved PDF");
                DownloadOutcome::success(path.display().to_string(), bytes.len() as u64)
            }
            Err(e) => {
                tracing::error!(pmid, error = %e, "failed to write PDF");
                DownloadOutcome::error(format!("write failed: {}", e))
            }
        }
    }

    /// Write bytes to `<dir>/<pmid>.pdf` with conservative permissions
    pub async fn write_pdf(dir: &Path, pmid: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).await?;
        }

        let path = dir.join(format!("{}.pdf", pmid));
        tokio::fs::write(&path, bytes).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_writes_file_on_200() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/12345.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.4 test")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let executor = DownloadExecutor::new().unwrap();
        let outcome = executor
            .fetch_to_dir(&format!("{}/12345.pdf", server.url()), dir.path(), "12345")
            .await;

        assert!(outcome.success);
        let saved = dir.path().join("12345.pdf");
        assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.4 test");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&saved).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_non_200_without_writing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/blocked.pdf")
            .with_status(403)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let executor = DownloadExecutor::new().unwrap();
        let outcome = executor
            .fetch_to_dir(&format!("{}/blocked.pdf", server.url()), dir.path(), "666")
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("403"));
        assert!(!dir.path().join("666.pdf").exists());
    }

    #[tokio::test]
    async fn test_fetch_creates_missing_directory() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/1.pdf")
            .with_status(200)
            .with_body(b"%PDF-1.4")
            .create_async()
            .await;

        let base = tempfile::tempdir().unwrap();
        let nested = base.path().join("public").join("download");
        let executor = DownloadExecutor::new().unwrap();
        let outcome = executor
            .fetch_to_dir(&format!("{}/1.pdf", server.url()), &nested, "1")
            .await;

        assert!(outcome.success);
        assert!(nested.join("1.pdf").exists());
    }
}
