//! Headless-browser fallback for URLs behind bot-detection gates.
//!
//! A plain HTTP fetch of a resolved URL is sometimes blocked by
//! challenge pages that only pass for a real browser context. This module
//! drives a headless Chromium configured to look like a standard desktop
//! browser. For `.pdf` URLs the page visit is followed by a plain fetch
//! with a PDF-accepting header so the raw bytes come back; for anything
//! else the rendered page source is returned for diagnostics only.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use std::time::Duration;
use url::Url;

use crate::sources::SourceError;

/// Desktop profile presented to challenge pages
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Settle time after navigation, before the page source is read
const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What a browser fetch produced
#[derive(Debug)]
pub enum BrowserFetch {
    /// Raw PDF bytes from the follow-up plain fetch
    Pdf(Vec<u8>),

    /// Rendered page source; diagnostic only, never article content
    PageSource(String),
}

/// One headless-browser session, owned by a single top-level call.
///
/// Acquired once and released with [`BrowserSession::close`] on every
/// path, including failures.
pub struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    http: reqwest::Client,
}

impl BrowserSession {
    /// Launch the headless browser.
    ///
    /// Launch failure is fatal for the calling operation: there is no
    /// fallback behind the fallback, so the error propagates.
    pub async fn launch() -> Result<Self, SourceError> {
        tracing::info!("launching headless browser");

        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", USER_AGENT))
            .build()
            .map_err(|e| SourceError::Other(format!("browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SourceError::Other(format!("browser launch failed: {}", e)))?;

        // The handler stream must be polled for the CDP connection to
        // make progress.
        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("headless browser ready");

        Ok(Self {
            browser,
            handler_task,
            http,
        })
    }

    /// Load a URL in the browser context.
    ///
    /// `.pdf` URLs get a follow-up plain fetch with a PDF Accept header
    /// and return bytes; other URLs return the rendered page source.
    pub async fn fetch(&self, url: &str) -> Result<BrowserFetch, SourceError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| SourceError::Network(format!("browser navigation failed: {}", e)))?;

        tokio::time::sleep(SETTLE_DELAY).await;

        if url_is_pdf(url) {
            let response = self
                .http
                .get(url)
                .header(reqwest::header::ACCEPT, "application/pdf")
                .send()
                .await
                .map_err(|e| SourceError::Network(format!("PDF fetch failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::OK {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| SourceError::Network(format!("PDF body read failed: {}", e)))?;
                let _ = page.close().await;
                return Ok(BrowserFetch::Pdf(bytes.to_vec()));
            }

            tracing::warn!(url, status = %response.status(), "PDF fetch through browser profile refused");
        }

        let source = page
            .content()
            .await
            .map_err(|e| SourceError::Network(format!("failed to read page source: {}", e)))?;

        let _ = page.close().await;

        let preview: String = source.chars().take(200).collect();
        tracing::info!(url, %preview, "page source");
        Ok(BrowserFetch::PageSource(source))
    }

    /// Shut the browser down. Safe to call exactly once on every exit
    /// path; errors are logged, not propagated.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }
        self.handler_task.abort();
    }
}

/// Whether the URL's path component names a PDF
fn url_is_pdf(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase().ends_with(".pdf"),
        Err(_) => url.to_lowercase().ends_with(".pdf"),
    }
}
