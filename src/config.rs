// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;

use crate::history::DEFAULT_ROWS_PER_PAGE;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("Failed to read {path}: {message}")]
    File { path: PathBuf, message: String },
}

/// Client settings after every source has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub download_dir: PathBuf,
    pub rows_per_page: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            download_dir: PathBuf::from("downloads"),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

/// One environment section of the config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub download_dir: Option<PathBuf>,
    pub rows_per_page: Option<usize>,
}

impl ClientConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows.max(1);
        self
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.api_url {
            self = self.with_api_url(url);
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self = self.with_timeout(seconds);
        }
        if let Some(dir) = overrides.download_dir {
            self = self.with_download_dir(dir);
        }
        if let Some(rows) = overrides.rows_per_page {
            self = self.with_rows_per_page(rows);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.rows_per_page, 10);
    }

    #[test]
    fn test_apply_overrides() {
        let config = ClientConfig::default().apply(ConfigOverrides {
            api_url: Some("https://resume.example.com/api/".to_string()),
            timeout_seconds: None,
            download_dir: Some(PathBuf::from("/tmp/out")),
            rows_per_page: Some(0),
        });
        assert_eq!(config.api_url, "https://resume.example.com/api");
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.download_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.rows_per_page, 1);
    }
}
