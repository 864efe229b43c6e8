//! Host configuration
//!
//! The config file holds a `[detection]` table for the component and a
//! `[feed]` table for the simulated data source. Command-line flags override
//! file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use infiniscroll_core::Config;
use serde::Deserialize;

/// Config directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "infiniscroll";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Simulated feed settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Items delivered per page
    pub page_size: usize,
    /// Total items before the feed is exhausted
    pub total_items: usize,
    /// Simulated response time
    pub latency_ms: u64,
    /// Probability that a page request fails (0.0 - 1.0)
    pub failure_rate: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            total_items: 200,
            latency_ms: 600,
            failure_rate: 0.1,
        }
    }
}

impl FeedConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Clamp values the feed cannot honor
    fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.failure_rate = if self.failure_rate.is_finite() {
            self.failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

/// Full host configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub detection: Config,
    pub feed: FeedConfig,
}

impl HostConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(text).context("Failed to parse config")?;
        Ok(Self {
            detection: config.detection.normalized(),
            feed: config.feed.normalized(),
        })
    }

    /// Load from `path`, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Directory for log files
pub fn logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.detection, Config::default());
    }

    #[test]
    fn test_parse_both_tables() {
        let config = HostConfig::from_toml_str(
            r#"
            [detection]
            threshold = 3
            use_intersection = false
            throttle_ms = 120

            [feed]
            page_size = 0
            total_items = 50
            failure_rate = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.threshold, 3);
        assert!(!config.detection.use_intersection);
        assert_eq!(config.detection.throttle_interval, Duration::from_millis(120));
        assert_eq!(config.feed.page_size, 1);
        assert_eq!(config.feed.total_items, 50);
        assert_eq!(config.feed.failure_rate, 1.0);
        assert_eq!(config.feed.latency_ms, 600);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feed]\nlatency_ms = 10\n").unwrap();

        let config = HostConfig::load_or_default(&path).unwrap();
        assert_eq!(config.feed.latency(), Duration::from_millis(10));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feed\n").unwrap();
        assert!(HostConfig::load_or_default(&path).is_err());
    }
}
