//! Throttled scroll position strategy

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::platform::{ListenerOptions, Platform, Region, ScrollMetrics, SubscriptionId};
use crate::throttle::Throttle;

/// Evaluates the distance to the end of content on scroll events
#[derive(Debug)]
pub struct ScrollStrategy {
    subscription: SubscriptionId,
    throttle: Throttle<()>,
}

impl ScrollStrategy {
    /// Subscribe to scroll events on the content region
    pub fn activate<P: Platform + ?Sized>(platform: &mut P, interval: Duration) -> Self {
        let subscription =
            platform.subscribe_scroll(Region::Content, ListenerOptions { passive: true });
        debug!(
            subscription = subscription.0,
            interval_ms = interval.as_millis() as u64,
            "scroll strategy active"
        );
        Self {
            subscription,
            throttle: Throttle::new(interval),
        }
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Record a scroll event; true if an evaluation should run now
    pub fn on_scroll(&mut self, now: Instant) -> bool {
        let run = self.throttle.call(now, ()).is_some();
        if !run {
            trace!("scroll evaluation deferred");
        }
        run
    }

    /// True if a deferred evaluation is due
    pub fn poll(&mut self, now: Instant) -> bool {
        self.throttle.poll(now).is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }

    /// The trigger condition
    pub fn is_near_end(metrics: &ScrollMetrics, threshold: u32) -> bool {
        metrics.distance_to_end() <= threshold
    }

    /// Remove the subscription; any deferred evaluation is dropped with it
    pub fn release<P: Platform + ?Sized>(self, platform: &mut P) {
        platform.unsubscribe_scroll(self.subscription);
        debug!(
            subscription = self.subscription.0,
            dropped_pending = self.throttle.has_pending(),
            "scroll strategy released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(offset: u32) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            scroll_extent: 1000,
            viewport_extent: 500,
        }
    }

    #[test]
    fn test_near_end_uses_inclusive_threshold() {
        assert!(ScrollStrategy::is_near_end(&metrics(451), 50));
        assert!(ScrollStrategy::is_near_end(&metrics(450), 50));
        assert!(!ScrollStrategy::is_near_end(&metrics(449), 50));
    }

    #[test]
    fn test_zero_threshold_requires_reaching_the_end() {
        assert!(!ScrollStrategy::is_near_end(&metrics(499), 0));
        assert!(ScrollStrategy::is_near_end(&metrics(500), 0));
    }
}
