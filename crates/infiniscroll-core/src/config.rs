//! Detection configuration
//!
//! `Config` is replaced wholesale per attach cycle; `ConfigUpdate` carries a
//! partial change applied by `Coordinator::configure`. Invalid values are
//! coerced to defaults instead of failing.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::constants::detection::{DEFAULT_THRESHOLD, DEFAULT_THROTTLE_INTERVAL};
use crate::error::Result;

/// Detection configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance from the end of content that counts as "near the end"
    #[serde(deserialize_with = "de_threshold")]
    pub threshold: u32,
    /// Watch the sentinel for visibility
    pub use_intersection: bool,
    /// Poll the scroll position on scroll events
    pub use_scroll: bool,
    /// Minimum spacing between scroll position evaluations
    #[serde(rename = "throttle_ms", deserialize_with = "de_throttle")]
    pub throttle_interval: Duration,
    /// Mark the component as loading at the moment `load` is dispatched
    ///
    /// When false, the host must call `set_loading(true)` from its listener
    /// to keep a second trigger from dispatching.
    pub latch_on_dispatch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            use_intersection: true,
            use_scroll: true,
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            latch_on_dispatch: true,
        }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        Ok(config.normalized())
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Coerce out-of-range values to their defaults
    pub fn normalized(mut self) -> Self {
        if self.throttle_interval.is_zero() {
            warn!("throttle interval must be positive, using default");
            self.throttle_interval = DEFAULT_THROTTLE_INTERVAL;
        }
        self
    }

    /// Apply a partial update, reporting which strategies it affects
    pub fn apply(&mut self, update: &ConfigUpdate) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        if let Some(threshold) = update.threshold {
            if threshold != self.threshold {
                self.threshold = threshold;
                // The scroll strategy reads the threshold at evaluation time
                changes.intersection = true;
            }
        }
        if let Some(enabled) = update.use_intersection {
            if enabled != self.use_intersection {
                self.use_intersection = enabled;
                changes.intersection = true;
            }
        }
        if let Some(enabled) = update.use_scroll {
            if enabled != self.use_scroll {
                self.use_scroll = enabled;
                changes.scroll = true;
            }
        }
        if let Some(interval) = update.throttle_interval {
            let interval = if interval.is_zero() {
                warn!("throttle interval must be positive, using default");
                DEFAULT_THROTTLE_INTERVAL
            } else {
                interval
            };
            if interval != self.throttle_interval {
                self.throttle_interval = interval;
                changes.scroll = true;
            }
        }
        if let Some(latch) = update.latch_on_dispatch {
            self.latch_on_dispatch = latch;
        }

        changes
    }
}

/// Partial configuration; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub threshold: Option<u32>,
    pub use_intersection: Option<bool>,
    pub use_scroll: Option<bool>,
    pub throttle_interval: Option<Duration>,
    pub latch_on_dispatch: Option<bool>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn use_intersection(mut self, enabled: bool) -> Self {
        self.use_intersection = Some(enabled);
        self
    }

    pub fn use_scroll(mut self, enabled: bool) -> Self {
        self.use_scroll = Some(enabled);
        self
    }

    pub fn throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = Some(interval);
        self
    }

    pub fn latch_on_dispatch(mut self, latch: bool) -> Self {
        self.latch_on_dispatch = Some(latch);
        self
    }
}

/// Strategies that must be rebuilt after a configuration change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    pub intersection: bool,
    pub scroll: bool,
}

impl ConfigChanges {
    pub fn any(&self) -> bool {
        self.intersection || self.scroll
    }
}

/// Parse a threshold the way markup attributes are parsed
///
/// Takes the leading integer of the text (`"120px"` is 120). Anything that
/// does not start with digits, and any negative value, becomes 0. Values past
/// `u32::MAX` saturate.
pub fn parse_threshold(text: &str) -> u32 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return DEFAULT_THRESHOLD;
    }
    if negative {
        warn!(value = text, "negative threshold, using default");
        return DEFAULT_THRESHOLD;
    }

    digits[..end].bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    })
}

fn de_threshold<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(match value {
        toml::Value::Integer(n) if n >= 0 => u32::try_from(n).unwrap_or(u32::MAX),
        toml::Value::Float(f) if f.is_finite() && f >= 0.0 => f.min(u32::MAX as f64) as u32,
        toml::Value::String(s) => parse_threshold(&s),
        other => {
            warn!(value = %other, "invalid threshold, using default");
            DEFAULT_THRESHOLD
        }
    })
}

fn de_throttle<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(match value {
        toml::Value::Integer(ms) if ms > 0 => Duration::from_millis(ms as u64),
        other => {
            warn!(value = %other, "invalid throttle interval, using default");
            DEFAULT_THROTTLE_INTERVAL
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threshold, 0);
        assert!(config.use_intersection);
        assert!(config.use_scroll);
        assert_eq!(config.throttle_interval, Duration::from_millis(200));
        assert!(config.latch_on_dispatch);
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("100"), 100);
        assert_eq!(parse_threshold("  42px"), 42);
        assert_eq!(parse_threshold("+7"), 7);
        assert_eq!(parse_threshold("abc"), 0);
        assert_eq!(parse_threshold(""), 0);
        assert_eq!(parse_threshold("-50"), 0);
        assert_eq!(parse_threshold("99999999999"), u32::MAX);
    }

    #[test]
    fn test_from_toml_coerces_invalid_values() {
        let config = Config::from_toml_str(
            r#"
            threshold = -20
            use_scroll = false
            throttle_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.threshold, 0);
        assert!(!config.use_scroll);
        assert!(config.use_intersection);
        assert_eq!(config.throttle_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_from_toml_accepts_string_threshold() {
        let config = Config::from_toml_str(r#"threshold = "80px""#).unwrap();
        assert_eq!(config.threshold, 80);
    }

    #[test]
    fn test_from_toml_rejects_malformed_document() {
        assert!(Config::from_toml_str("threshold = ").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "threshold = 64\nthrottle_ms = 50\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.threshold, 64);
        assert_eq!(config.throttle_interval, Duration::from_millis(50));

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_apply_reports_affected_strategies() {
        let mut config = Config::default();

        let changes = config.apply(&ConfigUpdate::new().threshold(30));
        assert_eq!(
            changes,
            ConfigChanges {
                intersection: true,
                scroll: false
            }
        );
        assert_eq!(config.threshold, 30);

        let changes = config.apply(&ConfigUpdate::new().throttle_interval(Duration::from_millis(80)));
        assert!(changes.scroll && !changes.intersection);

        // Same values again change nothing
        let changes = config.apply(
            &ConfigUpdate::new()
                .threshold(30)
                .throttle_interval(Duration::from_millis(80)),
        );
        assert!(!changes.any());
    }

    #[test]
    fn test_apply_coerces_zero_throttle() {
        let mut config = Config::default();
        config.throttle_interval = Duration::from_millis(50);
        let changes = config.apply(&ConfigUpdate::new().throttle_interval(Duration::ZERO));
        assert!(changes.scroll);
        assert_eq!(config.throttle_interval, DEFAULT_THROTTLE_INTERVAL);
    }
}
