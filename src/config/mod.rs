//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Resolution retry settings
    #[serde(default)]
    pub retry: RetrySettings,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// NCBI E-utilities API key (optional, for higher rate limits)
    #[serde(default)]
    pub ncbi: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            ncbi: std::env::var("NCBI_API_KEY").ok(),
        }
    }
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory PDFs are written to
    #[serde(default = "default_download_dir")]
    pub default_path: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_path: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./public/download")
}

/// Resolution retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per resolution call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in seconds; the wait grows linearly per attempt
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> u64 {
    5
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy::new(
            settings.max_attempts,
            Duration::from_secs(settings.base_delay_secs),
        )
    }
}

/// Load configuration from a file
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.clone()))
        .build()?;
    settings.try_deserialize()
}

/// Look for a config file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("litfetch.toml"),
        PathBuf::from(".litfetch.toml"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

/// Load configuration from the default locations, falling back to
/// defaults (with environment overrides) when no file exists
pub fn get_config() -> Config {
    if let Some(path) = find_config_file() {
        match load_config(&path) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load config file");
            }
        }
    }
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config {
            api_keys: ApiKeys { ncbi: None },
            ..Default::default()
        };
        assert_eq!(config.downloads.default_path, PathBuf::from("./public/download"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_secs, 5);
    }

    #[test]
    fn test_retry_settings_to_policy() {
        let settings = RetrySettings {
            max_attempts: 4,
            base_delay_secs: 2,
        };
        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.delay_for(3), Duration::from_secs(6));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "[api_keys]\nncbi = \"testkey\"\n\n[retry]\nmax_attempts = 5\n"
        )
        .unwrap();

        let config = load_config(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.api_keys.ncbi.as_deref(), Some("testkey"));
        assert_eq!(config.retry.max_attempts, 5);
        // Unset sections fall back to defaults
        assert_eq!(config.retry.base_delay_secs, 5);
    }
}
