use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use litfetch::browser::{BrowserFetch, BrowserSession};
use litfetch::config::{get_config, load_config, Config};
use litfetch::download::DownloadExecutor;
use litfetch::models::Resolution;
use litfetch::resolver::ArticleSourceResolver;
use litfetch::sources::{CrossRefClient, MetadataSource, PmcClient, PubMedClient};
use litfetch::translate::{translate_file, Language};

/// litfetch - Search PubMed, download full-text PDFs, and translate documents
#[derive(Parser, Debug)]
#[command(name = "litfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search PubMed, resolve and download full-text PDFs, and translate documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and download the full-text PDF for a PubMed article
    Download {
        /// PubMed ID to download
        #[arg(long)]
        pmid: String,

        /// Directory to save the PDF to (default: ./public/download)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Search PubMed articles
    Search {
        /// Search query
        #[arg(long)]
        query: String,

        /// Print only the first matching PMID
        #[arg(long = "return_pmid")]
        return_pmid: bool,
    },

    /// Translate a local document to a supported target language
    Translate {
        /// Path to the file to translate (.txt/.pdf/.doc/.docx)
        #[arg(long)]
        file: PathBuf,

        /// Target language code (fr, de, es, it, pt, ru, zh, ja, ko)
        #[arg(long = "target_lang")]
        target_lang: String,
    },

    /// Check connectivity to the NCBI E-utilities API
    #[command(alias = "diag")]
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("litfetch={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else {
        get_config()
    };

    let success = match cli.command {
        Commands::Download { pmid, dir } => run_download(&config, &pmid, dir).await?,
        Commands::Search { query, return_pmid } => run_search(&config, &query, return_pmid).await,
        Commands::Translate { file, target_lang } => run_translate(file, &target_lang).await?,
        Commands::Doctor => run_doctor(&config).await,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolve the article's full-text URL and download it, with the browser
/// fallback when the plain fetch is refused.
async fn run_download(config: &Config, pmid: &str, dir: Option<PathBuf>) -> Result<bool> {
    let dir = dir.unwrap_or_else(|| config.downloads.default_path.clone());

    // The browser engine has no fallback of its own: a launch failure is
    // fatal for the run.
    let session = BrowserSession::launch().await?;

    let result = download_one(config, pmid, &dir, &session).await;

    // Session is released on every path, including failures.
    session.close().await;

    let success = match result {
        Ok(success) => success,
        Err(e) => {
            tracing::error!(pmid, error = %e, "error processing PMID");
            false
        }
    };

    if success {
        println!("Successfully downloaded PDF for PMID {}", pmid);
    } else {
        println!("Failed to download PDF for PMID {}", pmid);
    }
    Ok(success)
}

async fn download_one(
    config: &Config,
    pmid: &str,
    dir: &std::path::Path,
    session: &BrowserSession,
) -> Result<bool> {
    let pubmed = Arc::new(PubMedClient::new(config.api_keys.ncbi.clone())?);

    match pubmed.article_by_pmid(pmid).await {
        Ok(article) => {
            tracing::info!(pmid, title = %article.title, journal = %article.journal, "article");
        }
        Err(e) => tracing::warn!(pmid, error = %e, "article metadata lookup failed"),
    }

    let resolver = ArticleSourceResolver::new(
        Arc::new(PmcClient::new()?),
        Arc::clone(&pubmed) as Arc<dyn MetadataSource>,
        Arc::new(CrossRefClient::new()?),
    )
    .with_policy((&config.retry).into());

    let url = match resolver.resolve(pmid).await {
        Resolution::Found { url, .. } => url,
        Resolution::MetadataOnly { doi } => {
            println!(
                "Found metadata for PMID {} (DOI {}), but no full-text URL",
                pmid, doi
            );
            return Ok(false);
        }
        Resolution::NotFound => {
            tracing::info!(pmid, "no PDF available");
            return Ok(false);
        }
    };

    tracing::info!(pmid, url = %url, "attempting to download PDF");
    let executor = DownloadExecutor::new()?;
    let outcome = executor.fetch_to_dir(&url, dir, pmid).await;
    if outcome.success {
        return Ok(true);
    }

    tracing::warn!(
        pmid,
        error = outcome.error.as_deref().unwrap_or("unknown"),
        "plain fetch failed, trying browser fallback"
    );

    match session.fetch(&url).await {
        Ok(BrowserFetch::Pdf(bytes)) => match DownloadExecutor::write_pdf(dir, pmid, &bytes).await
        {
            Ok(path) => {
                tracing::info!(pmid, path = %path.display(), "saved PDF via browser fallback");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(pmid, error = %e, "failed to write PDF");
                Ok(false)
            }
        },
        Ok(BrowserFetch::PageSource(_)) => {
            tracing::warn!(pmid, "browser returned page source, not article content");
            Ok(false)
        }
        Err(e) => {
            tracing::error!(pmid, error = %e, "browser fallback failed");
            Ok(false)
        }
    }
}

/// Search PubMed and print the first match.
async fn run_search(config: &Config, query: &str, return_pmid: bool) -> bool {
    let pubmed = match PubMedClient::new(config.api_keys.ncbi.clone()) {
        Ok(client) => client,
        Err(e) => {
            println!("Error during search: {}", e);
            return false;
        }
    };

    let pmids = match pubmed.pmids_for_query(query, 1).await {
        Ok(pmids) => pmids,
        Err(e) => {
            println!("Error during search: {}", e);
            return false;
        }
    };

    if pmids.is_empty() {
        println!("No results found");
        return true;
    }

    if return_pmid {
        println!("PMID: {}", pmids[0]);
        return true;
    }

    for pmid in pmids.iter().take(1) {
        let article = match pubmed.article_by_pmid(pmid).await {
            Ok(article) => article,
            Err(e) => {
                println!("Error during search: {}", e);
                return false;
            }
        };

        println!();
        println!("Title: {}", article.title);
        println!("Authors: {}", article.author_line());
        println!("Journal: {}", article.journal);
        println!(
            "Year: {}",
            article.year.map(|y| y.to_string()).unwrap_or_default()
        );
        println!("Abstract: {}", article.abstract_text);

        // Inter-item rate limiting
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    true
}

/// Translate a document; the language is validated before any file read.
async fn run_translate(file: PathBuf, target_lang: &str) -> Result<bool> {
    let lang = match Language::from_code(target_lang) {
        Some(lang) => lang,
        None => {
            println!(
                "Unsupported target language. Supported languages: {}",
                Language::supported_names()
            );
            return Ok(false);
        }
    };

    // Model load and inference are blocking
    let translated =
        tokio::task::spawn_blocking(move || translate_file(&file, lang)).await?;

    match translated {
        Ok(text) => {
            println!("{}", text);
            Ok(true)
        }
        Err(e) => {
            println!("{}", e);
            Ok(false)
        }
    }
}

/// Smoke-test the E-utilities endpoint with the configured API key.
async fn run_doctor(config: &Config) -> bool {
    let pubmed = match PubMedClient::new(config.api_keys.ncbi.clone()) {
        Ok(client) => client,
        Err(e) => {
            println!("Failed to connect: {}", e);
            return false;
        }
    };

    match pubmed.ping().await {
        Ok(preview) => {
            println!("API key is working. Response: {}", preview);
            true
        }
        Err(e) => {
            println!("Failed to connect: {}", e);
            false
        }
    }
}
