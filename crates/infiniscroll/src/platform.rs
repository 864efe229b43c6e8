//! Terminal platform
//!
//! Implements the component's platform seams over a row-based list. Scroll
//! geometry is measured in rows. Observers and subscriptions only queue
//! events; the app drains the queue and feeds it to the coordinator, which
//! keeps callbacks asynchronous with respect to the calls that caused them.

use std::collections::{HashMap, VecDeque};

use infiniscroll_core::{
    IntersectionEntry, IntersectionOptions, IntersectionService, ListenerOptions, ObserverId,
    Platform, Region, ScrollMetrics, SubscriptionId,
};
use tracing::trace;

/// Callback queued for delivery to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Intersection(ObserverId, Vec<IntersectionEntry>),
    Scroll(SubscriptionId),
}

/// Row geometry of the list
///
/// The sentinel occupies the row right after the content while shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListGeometry {
    /// Rows of content above the sentinel
    pub content_rows: u32,
    /// Rows visible in the viewport
    pub viewport_rows: u32,
    /// First visible row
    pub offset: u32,
    /// Whether the sentinel row is part of the list
    pub sentinel_shown: bool,
}

impl ListGeometry {
    /// Scrollable rows including the sentinel
    pub fn total_rows(&self) -> u32 {
        self.content_rows + u32::from(self.sentinel_shown)
    }

    pub fn max_offset(&self) -> u32 {
        self.total_rows().saturating_sub(self.viewport_rows)
    }

    /// Whether the sentinel row lies within the viewport extended by `margin` rows
    fn sentinel_in_view(&self, margin: u32) -> bool {
        let sentinel_row = self.content_rows;
        let view_end = self
            .offset
            .saturating_add(self.viewport_rows)
            .saturating_add(margin);
        sentinel_row >= self.offset && sentinel_row < view_end
    }
}

#[derive(Debug)]
struct Observer {
    options: IntersectionOptions,
    last_reported: Option<bool>,
}

/// Visibility observers for the sentinel row
#[derive(Debug, Default)]
pub struct RowObservers {
    next_id: u64,
    active: HashMap<ObserverId, Observer>,
}

impl IntersectionService for RowObservers {
    fn observe(&mut self, target: Region, options: IntersectionOptions) -> ObserverId {
        debug_assert_eq!(target, Region::Sentinel);
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.active.insert(
            id,
            Observer {
                options,
                last_reported: None,
            },
        );
        id
    }

    fn disconnect(&mut self, observer: ObserverId) {
        self.active.remove(&observer);
    }
}

/// Platform over a terminal list
#[derive(Debug, Default)]
pub struct TerminalPlatform {
    geometry: ListGeometry,
    observers: RowObservers,
    next_subscription: u64,
    subscriptions: Vec<SubscriptionId>,
    queue: VecDeque<PlatformEvent>,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geometry(&self) -> ListGeometry {
        self.geometry
    }

    pub fn set_content_rows(&mut self, rows: u32) {
        self.geometry.content_rows = rows;
        self.clamp_offset();
    }

    pub fn set_viewport_rows(&mut self, rows: u32) {
        self.geometry.viewport_rows = rows;
        self.clamp_offset();
    }

    /// Show or hide the sentinel row (it only counts while shown)
    pub fn set_sentinel_shown(&mut self, shown: bool) {
        self.geometry.sentinel_shown = shown;
        self.clamp_offset();
    }

    /// User scroll by `delta` rows
    pub fn scroll_by(&mut self, delta: i64) {
        let target = (i64::from(self.geometry.offset) + delta)
            .clamp(0, i64::from(self.geometry.max_offset()));
        self.scroll_to(target as u32);
    }

    fn scroll_to(&mut self, offset: u32) {
        let offset = offset.min(self.geometry.max_offset());
        if offset == self.geometry.offset {
            return;
        }
        self.geometry.offset = offset;
        for subscription in &self.subscriptions {
            self.queue.push_back(PlatformEvent::Scroll(*subscription));
        }
    }

    fn clamp_offset(&mut self) {
        self.geometry.offset = self.geometry.offset.min(self.geometry.max_offset());
    }

    /// Queue visibility reports for observers whose sentinel state changed
    pub fn refresh(&mut self) {
        for (id, observer) in self.observers.active.iter_mut() {
            let visible = self.geometry.sentinel_shown
                && self
                    .geometry
                    .sentinel_in_view(observer.options.root_margin.bottom);
            if observer.last_reported == Some(visible) {
                continue;
            }
            observer.last_reported = Some(visible);
            let ratio = if visible { 1.0 } else { 0.0 };
            trace!(observer = id.0, visible, "sentinel visibility changed");
            self.queue.push_back(PlatformEvent::Intersection(
                *id,
                vec![IntersectionEntry {
                    target: Region::Sentinel,
                    is_intersecting: visible && ratio >= observer.options.ratio,
                    intersection_ratio: ratio,
                }],
            ));
        }
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        self.queue.drain(..).collect()
    }

    pub fn active_handles(&self) -> usize {
        self.observers.active.len() + self.subscriptions.len()
    }
}

impl Platform for TerminalPlatform {
    fn intersection(&mut self) -> Option<&mut dyn IntersectionService> {
        Some(&mut self.observers)
    }

    fn subscribe_scroll(&mut self, region: Region, _options: ListenerOptions) -> SubscriptionId {
        debug_assert_eq!(region, Region::Content);
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.push(id);
        id
    }

    fn unsubscribe_scroll(&mut self, subscription: SubscriptionId) {
        self.subscriptions.retain(|s| *s != subscription);
    }

    fn scroll_metrics(&self, _region: Region) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.geometry.offset,
            scroll_extent: self.geometry.total_rows(),
            viewport_extent: self.geometry.viewport_rows,
        }
    }

    fn set_scroll_offset(&mut self, _region: Region, offset: u32) {
        self.scroll_to(offset);
    }
}
