//! Client configuration.
//!
//! Layering, lowest to highest precedence: built-in defaults, the TOML config
//! file, the `SST_API_URL` environment variable, then CLI flags (applied by
//! the caller through the builder-style setters).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SstError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "SST_API_URL";

/// Runtime configuration shared by the API client and the polling views.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// How often the dashboard and workspace re-fetch server state.
    pub poll_interval: Duration,
    /// Countdown refresh period in the workspace.
    pub tick_interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// JSON file standing in for browser local storage.
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(2000),
            tick_interval: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            storage_path: default_storage_path(),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    storage_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Load the configuration from `path`, or from the default config file
    /// location when `path` is `None`. A missing default file is not an error;
    /// a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = ClientConfig::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(file) = file {
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                SstError::Config(format!("failed to read {}: {e}", file.display()))
            })?;
            config = config.merge_toml(&contents)?;
            tracing::debug!(path = %file.display(), "loaded config file");
        }

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config = config.base_url(url);
            }
        }

        Ok(config)
    }

    /// Overlay the keys present in a TOML document onto `self`.
    pub fn merge_toml(mut self, contents: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| SstError::Config(e.to_string()))?;

        if let Some(url) = file.base_url {
            self = self.base_url(url);
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll_interval = non_zero_millis("poll_interval_ms", ms)?;
        }
        if let Some(ms) = file.tick_interval_ms {
            self.tick_interval = non_zero_millis("tick_interval_ms", ms)?;
        }
        if let Some(ms) = file.connect_timeout_ms {
            self.connect_timeout = non_zero_millis("connect_timeout_ms", ms)?;
        }
        if let Some(ms) = file.request_timeout_ms {
            self.request_timeout = non_zero_millis("request_timeout_ms", ms)?;
        }
        if let Some(path) = file.storage_path {
            self.storage_path = path;
        }
        Ok(self)
    }

    /// Override the backend origin. Trailing slashes are stripped so that
    /// endpoint paths can be appended verbatim.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }
}

fn non_zero_millis(key: &str, ms: u64) -> Result<Duration> {
    if ms == 0 {
        return Err(SstError::Config(format!("{key} must be greater than zero")));
    }
    Ok(Duration::from_millis(ms))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sst").join("config.toml"))
}

pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sst")
        .join("storage.json")
}
