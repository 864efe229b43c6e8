//! Markup attribute adapter
//!
//! Hosts that configure the component through string attributes go through
//! here. Parsing follows the usual markup conventions: flags that default to
//! on are on unless the value is exactly `"false"`, `loading` is on only for
//! `"true"`, and numbers take their leading integer.

use std::time::Duration;

use crate::config::{parse_threshold, ConfigUpdate};
use crate::constants::detection::DEFAULT_THROTTLE_INTERVAL;
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Attribute names the component reacts to
pub const OBSERVED_ATTRIBUTES: &[&str] = &[
    "threshold",
    "use-observer",
    "use-scroll",
    "loading",
    "has-more",
    "throttle",
];

fn default_on(value: Option<&str>) -> bool {
    value != Some("false")
}

fn parse_throttle(value: Option<&str>) -> Duration {
    match value.map(parse_threshold) {
        Some(ms) if ms > 0 => Duration::from_millis(u64::from(ms)),
        _ => DEFAULT_THROTTLE_INTERVAL,
    }
}

/// Apply one attribute change; `None` means the attribute was removed
pub fn apply_attribute<P: Platform>(
    coordinator: &mut Coordinator<P>,
    name: &str,
    value: Option<&str>,
) -> Result<()> {
    match name {
        "threshold" => {
            let threshold = value.map(parse_threshold).unwrap_or_default();
            coordinator.configure(ConfigUpdate::new().threshold(threshold));
        }
        "use-observer" => {
            coordinator.configure(ConfigUpdate::new().use_intersection(default_on(value)));
        }
        "use-scroll" => {
            coordinator.configure(ConfigUpdate::new().use_scroll(default_on(value)));
        }
        "throttle" => {
            coordinator.configure(ConfigUpdate::new().throttle_interval(parse_throttle(value)));
        }
        "loading" => coordinator.set_loading(value == Some("true")),
        "has-more" => coordinator.set_has_more(default_on(value)),
        other => return Err(Error::UnknownAttribute(other.to_string())),
    }
    Ok(())
}

/// Current configuration and state rendered as attributes
pub fn attributes<P: Platform>(coordinator: &Coordinator<P>) -> Vec<(&'static str, String)> {
    let config = coordinator.config();
    vec![
        ("threshold", config.threshold.to_string()),
        ("use-observer", config.use_intersection.to_string()),
        ("use-scroll", config.use_scroll.to_string()),
        ("loading", coordinator.is_loading().to_string()),
        ("has-more", coordinator.has_more().to_string()),
        (
            "throttle",
            config.throttle_interval.as_millis().to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_on_flags() {
        assert!(default_on(None));
        assert!(default_on(Some("true")));
        assert!(default_on(Some("")));
        assert!(default_on(Some("no")));
        assert!(!default_on(Some("false")));
    }

    #[test]
    fn test_parse_throttle() {
        assert_eq!(parse_throttle(Some("50")), Duration::from_millis(50));
        assert_eq!(parse_throttle(Some("0")), DEFAULT_THROTTLE_INTERVAL);
        assert_eq!(parse_throttle(Some("fast")), DEFAULT_THROTTLE_INTERVAL);
        assert_eq!(parse_throttle(None), DEFAULT_THROTTLE_INTERVAL);
    }

    #[test]
    fn test_observed_attributes_are_unique() {
        let mut names = OBSERVED_ATTRIBUTES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OBSERVED_ATTRIBUTES.len());
    }
}
