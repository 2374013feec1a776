//! Companion configuration
//!
//! Read from YAML. Every field has a default, so an empty file (or no file)
//! is a valid configuration. `API_BASE_URL` in the environment overrides the
//! configured base URL.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_base_url`.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Root of the analysis API, without a trailing slash
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    /// Chat history kept per session
    pub max_chat_messages: usize,
    pub novel_list_limit: usize,
    pub chapter_list_limit: usize,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: 30,
            max_chat_messages: 50,
            novel_list_limit: 50,
            chapter_list_limit: 100,
        }
    }
}

impl CompanionConfig {
    /// `<config_dir>/novel-companion/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("novel-companion").join("config.yaml"))
    }

    /// Parse a YAML document. Empty input yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load an explicit config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else the default path when that file
    /// exists, else the defaults. The environment override is applied last.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "loading config");
                    Self::load(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(self) -> Self {
        self.apply_base_url_override(std::env::var(BASE_URL_ENV).ok().as_deref())
    }

    /// Replace the base URL when `value` is non-blank. Trailing slashes are dropped.
    pub fn apply_base_url_override(mut self, value: Option<&str>) -> Self {
        if let Some(url) = value.map(str::trim).filter(|u| !u.is_empty()) {
            self.api_base_url = url.to_string();
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
