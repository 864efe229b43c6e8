//! Sentinel visibility strategy

use tracing::debug;

use crate::constants::detection::SENTINEL_VISIBILITY_RATIO;
use crate::platform::{
    IntersectionEntry, IntersectionOptions, ObserverId, Platform, Region, RootMargin,
};

/// Watches the sentinel inside the content region
///
/// The threshold is baked into the observer's root margin, so a threshold
/// change means a new strategy.
#[derive(Debug)]
pub struct IntersectionStrategy {
    observer: ObserverId,
    threshold: u32,
}

impl IntersectionStrategy {
    /// Observer parameters for a threshold
    pub fn options(threshold: u32) -> IntersectionOptions {
        IntersectionOptions {
            root: Region::Content,
            root_margin: RootMargin::trailing(threshold),
            ratio: SENTINEL_VISIBILITY_RATIO,
        }
    }

    /// Start observing the sentinel
    ///
    /// Returns `None` when the platform has no visibility observation.
    pub fn activate<P: Platform + ?Sized>(platform: &mut P, threshold: u32) -> Option<Self> {
        let Some(service) = platform.intersection() else {
            debug!("intersection observation unavailable, relying on scroll strategy");
            return None;
        };
        let observer = service.observe(Region::Sentinel, Self::options(threshold));
        debug!(observer = observer.0, threshold, "intersection strategy active");
        Some(Self {
            observer,
            threshold,
        })
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Number of entries reporting the sentinel as intersecting
    pub fn detections(&self, entries: &[IntersectionEntry]) -> usize {
        entries
            .iter()
            .filter(|e| e.target == Region::Sentinel && e.is_intersecting)
            .count()
    }

    /// Disconnect the observer
    pub fn release<P: Platform + ?Sized>(self, platform: &mut P) {
        if let Some(service) = platform.intersection() {
            service.disconnect(self.observer);
            debug!(observer = self.observer.0, "intersection strategy released");
        }
    }
}
