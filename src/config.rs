//! Configuration types for pool-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Remote API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (default: "https://e621.net")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum gap between two consecutive API calls (default: 2 seconds)
    #[serde(default = "default_request_interval", with = "duration_serde")]
    pub request_interval: Duration,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_interval: default_request_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory that collection folders are created under (default: ".")
    ///
    /// Paths stored in the ledger are relative to this directory.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum number of items in flight per collection (default: 4)
    #[serde(default = "default_max_concurrent_items")]
    pub max_concurrent_items: usize,

    /// Skip items the ledger already records as downloaded (default: true)
    ///
    /// When false every item of a collection is fetched again.
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Upper bound on a single payload transfer (default: 300 seconds)
    #[serde(default = "default_payload_timeout", with = "duration_serde")]
    pub payload_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_items: default_max_concurrent_items(),
            skip_existing: true,
            payload_timeout: default_payload_timeout(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Ledger database path (default: "./e6dl_downloads.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for [`Downloader`](crate::Downloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Ledger location
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load configuration from a JSON file, filling unspecified fields with defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_items == 0 {
            return Err(Error::Config {
                message: "max_concurrent_items must be at least 1".to_string(),
                key: Some("max_concurrent_items".to_string()),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: "base_url must not be empty".to_string(),
                key: Some("base_url".to_string()),
            });
        }
        Ok(())
    }

    /// Base download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }
}

fn default_base_url() -> String {
    "https://e621.net".to_string()
}

fn default_user_agent() -> String {
    format!("pool-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent_items() -> usize {
    4
}

fn default_payload_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("e6dl_downloads.db")
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
