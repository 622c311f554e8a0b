//! Configuration types for docket-dl

use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Public bucket that mirrors regulations.gov
pub const DEFAULT_BUCKET: &str = "mirrulations";

/// Hard cap on concurrent transfers
pub const MAX_WORKERS: usize = 8;

/// Concurrent transfers when nothing else is configured
pub const DEFAULT_MAX_WORKERS: usize = MAX_WORKERS;

/// Region the public mirror lives in
pub const DEFAULT_REGION: &str = "us-east-1";

/// Largest page size S3 will return for ListObjectsV2
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Object store connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bucket name (default: "mirrulations")
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Region used to address the bucket (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint, addressed path-style (default: AWS virtual-hosted URL)
    ///
    /// Useful for LocalStack/MinIO mirrors, e.g. `http://localhost:4566`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Keys requested per listing page (default: 1000)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// TCP connect timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            page_size: default_page_size(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Download behavior configuration (destination, concurrency, scope)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Folder that receives `<docket_id>/` (default: current directory)
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,

    /// Maximum concurrent transfers, between 1 and 8 (default: 8)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Also download binary attachments when the docket has any
    #[serde(default)]
    pub include_binary: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            max_workers: default_max_workers(),
            include_binary: false,
        }
    }
}

/// Status line rendering
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Width the status line is padded to (default: 80)
    #[serde(default = "default_line_width")]
    pub line_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            line_width: default_line_width(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Object store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Status line rendering
    #[serde(default)]
    pub progress: ProgressConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.store.bucket.trim().is_empty() {
            return Err(Error::Config {
                message: "bucket name must not be empty".to_string(),
                key: Some("store.bucket".to_string()),
            });
        }
        if self.store.region.trim().is_empty() {
            return Err(Error::Config {
                message: "region must not be empty".to_string(),
                key: Some("store.region".to_string()),
            });
        }
        if self.store.page_size == 0 {
            return Err(Error::Config {
                message: "page size must be at least 1".to_string(),
                key: Some("store.page_size".to_string()),
            });
        }
        if let Some(endpoint) = &self.store.endpoint
            && url::Url::parse(endpoint).is_err()
        {
            return Err(Error::Config {
                message: format!("endpoint {endpoint:?} is not a valid URL"),
                key: Some("store.endpoint".to_string()),
            });
        }
        if !(1..=MAX_WORKERS).contains(&self.download.max_workers) {
            return Err(Error::Config {
                message: format!(
                    "download workers must be between 1 and {MAX_WORKERS}, got {}",
                    self.download.max_workers
                ),
                key: Some("download.max_workers".to_string()),
            });
        }
        Ok(())
    }
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_line_width() -> usize {
    80
}

// Duration serialization helper
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
