//! Component constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// Detection defaults
pub mod detection {
    use super::*;

    /// Distance from the end of content that counts as "near the end"
    pub const DEFAULT_THRESHOLD: u32 = 0;

    /// Minimum spacing between scroll position evaluations
    pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(200);

    /// Fraction of the sentinel that must be visible before it counts as intersecting
    pub const SENTINEL_VISIBILITY_RATIO: f32 = 0.1;
}

/// Default region content shown when the host provides none
pub mod regions {
    /// Loading indicator
    pub const DEFAULT_LOADING: &str = "◌ Loading…";

    /// End-of-content indicator
    pub const DEFAULT_END: &str = "No more content";

    /// Error indicator
    pub const DEFAULT_ERROR: &str = "Failed to load, please retry";
}
