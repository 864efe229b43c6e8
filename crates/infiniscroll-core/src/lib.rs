//! infiniscroll core - end-of-content detection for scrollable lists
//!
//! This crate provides a platform-agnostic infinite-scroll component:
//! - Sentinel visibility and throttled scroll-position detection
//! - A single load gate so only one `load` notification is outstanding
//! - Ready / loading / exhausted / error presentation state
//! - A reusable trailing-edge throttle
//!
//! It does not fetch or render data. A host implements [`Platform`], feeds
//! platform callbacks into the [`Coordinator`], and answers `load`
//! notifications with `set_loading` / `set_has_more` / `show_error`.

pub mod attributes;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod platform;
pub mod presentation;
pub mod state;
pub mod strategy;
pub mod throttle;


// Re-exports for convenience
pub use config::{Config, ConfigUpdate};
pub use coordinator::{Coordinator, Lifecycle, ListenerId, LoadEvent, LoadListener};
pub use error::{Error, Result};
pub use platform::{
    IntersectionEntry, IntersectionOptions, IntersectionService, ListenerOptions, ObserverId,
    Platform, Region, RootMargin, ScrollMetrics, SubscriptionId,
};
pub use presentation::{Presentation, RegionContent};
pub use state::{LoadState, Phase};
pub use throttle::{Throttle, Throttled};
