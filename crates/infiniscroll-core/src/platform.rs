//! Platform seams
//!
//! The component never talks to a windowing system directly. A host provides
//! visibility observation and scroll subscriptions through [`Platform`], then
//! feeds the resulting callbacks back into the coordinator tagged with the
//! handle it returned here. Handles are plain ids; the coordinator releases
//! every handle it acquired.

/// Regions of the presentation shell a platform may be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Scrollable content viewport (also the observation root)
    Content,
    /// Marker placed after the content
    Sentinel,
    /// Loading indicator overlay
    Loading,
    /// End-of-content overlay
    End,
    /// Error overlay
    Error,
}

/// Handle of an active visibility observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Handle of an active scroll subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Margins added around the observation root before intersecting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootMargin {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl RootMargin {
    /// Extend only the trailing (bottom) edge
    pub fn trailing(distance: u32) -> Self {
        Self {
            bottom: distance,
            ..Self::default()
        }
    }
}

/// Parameters of a visibility observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionOptions {
    /// Region acting as the viewport
    pub root: Region,
    /// Margin applied to the root
    pub root_margin: RootMargin,
    /// Visible fraction of the target that counts as intersecting
    pub ratio: f32,
}

/// One visibility report for an observed target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: Region,
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

/// Scroll geometry of a region, in the host's units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Current offset from the start
    pub offset: u32,
    /// Total scrollable extent of the content
    pub scroll_extent: u32,
    /// Visible extent of the viewport
    pub viewport_extent: u32,
}

impl ScrollMetrics {
    /// Remaining distance between the end of the viewport and the end of the content
    pub fn distance_to_end(&self) -> u32 {
        self.scroll_extent
            .saturating_sub(self.offset)
            .saturating_sub(self.viewport_extent)
    }
}

/// Delivery options for a scroll subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// The listener never blocks the platform's scrolling
    pub passive: bool,
}

/// Viewport visibility observation service
pub trait IntersectionService {
    /// Start observing `target`; callbacks are delivered asynchronously to
    /// `Coordinator::on_intersection` with the returned id
    fn observe(&mut self, target: Region, options: IntersectionOptions) -> ObserverId;

    /// Stop observing and release the observer
    fn disconnect(&mut self, observer: ObserverId);
}

/// Host capabilities the component depends on
pub trait Platform {
    /// Visibility observation, or `None` when the platform lacks it
    fn intersection(&mut self) -> Option<&mut dyn IntersectionService>;

    /// Subscribe to scroll position changes of `region`
    fn subscribe_scroll(&mut self, region: Region, options: ListenerOptions) -> SubscriptionId;

    /// Remove a scroll subscription
    fn unsubscribe_scroll(&mut self, subscription: SubscriptionId);

    /// Current scroll geometry of `region`
    fn scroll_metrics(&self, region: Region) -> ScrollMetrics;

    /// Move the scroll offset of `region`
    fn set_scroll_offset(&mut self, region: Region, offset: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_end() {
        let metrics = ScrollMetrics {
            offset: 451,
            scroll_extent: 1000,
            viewport_extent: 500,
        };
        assert_eq!(metrics.distance_to_end(), 49);
    }

    #[test]
    fn test_distance_to_end_saturates_on_overscroll() {
        let metrics = ScrollMetrics {
            offset: 600,
            scroll_extent: 1000,
            viewport_extent: 500,
        };
        assert_eq!(metrics.distance_to_end(), 0);

        // Content shorter than the viewport
        let metrics = ScrollMetrics {
            offset: 0,
            scroll_extent: 200,
            viewport_extent: 500,
        };
        assert_eq!(metrics.distance_to_end(), 0);
    }

    #[test]
    fn test_trailing_margin() {
        let margin = RootMargin::trailing(120);
        assert_eq!(margin.bottom, 120);
        assert_eq!(margin.top + margin.left + margin.right, 0);
    }
}
