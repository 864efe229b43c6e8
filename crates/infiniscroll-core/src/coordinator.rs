//! Detection coordinator
//!
//! Owns the configuration, the load state, the presentation shell and the
//! active strategies. Both strategies report into a single gate
//! ([`Coordinator::on_intersection`], [`Coordinator::on_scroll`],
//! [`Coordinator::tick`]), which dispatches at most one `load` notification
//! while the host has not finished the previous one.

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::attributes;
use crate::config::{Config, ConfigUpdate};
use crate::error::Result;
use crate::platform::{IntersectionEntry, ObserverId, Platform, Region, SubscriptionId};
use crate::presentation::{Presentation, RegionContent, Shell};
use crate::state::{LoadState, Phase};
use crate::strategy::{IntersectionStrategy, ScrollStrategy, TriggerSource};

/// Payload of the `load` notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadEvent {
    /// Dispatch time in epoch milliseconds
    pub timestamp: i64,
}

impl LoadEvent {
    fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Receiver of `load` notifications
///
/// The listener gets the live load state so it can mark the component as
/// loading (or exhausted, or failed) before the next trigger is evaluated.
/// Presentation is recomputed once dispatch returns.
pub trait LoadListener {
    fn on_load(&mut self, event: &LoadEvent, state: &mut LoadState);
}

impl<F> LoadListener for F
where
    F: FnMut(&LoadEvent, &mut LoadState),
{
    fn on_load(&mut self, event: &LoadEvent, state: &mut LoadState) {
        self(event, state)
    }
}

/// Handle returned by [`Coordinator::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Component lifecycle hooks, as driven by a host's component model
pub trait Lifecycle {
    /// Called when the component enters its host context
    fn attach(&mut self);

    /// Called when the component leaves its host context
    fn detach(&mut self);

    /// Called when a markup attribute changes; `None` means removed
    fn attribute_changed(&mut self, name: &str, value: Option<&str>) -> Result<()>;
}

/// The infinite-scroll detection component
pub struct Coordinator<P: Platform> {
    platform: P,
    config: Config,
    state: LoadState,
    shell: Shell,
    attached: bool,
    intersection: Option<IntersectionStrategy>,
    scroll: Option<ScrollStrategy>,
    listeners: Vec<(ListenerId, Box<dyn LoadListener>)>,
    next_listener_id: u64,
    dispatched: u64,
}

impl<P: Platform> Coordinator<P> {
    /// Create a detached coordinator
    pub fn new(platform: P, config: Config) -> Self {
        let state = LoadState::default();
        Self {
            platform,
            config: config.normalized(),
            shell: Shell::new(state.phase()),
            state,
            attached: false,
            intersection: None,
            scroll: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            dispatched: 0,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Build the shell and activate strategies
    ///
    /// Attaching again tears down the previous strategies first.
    pub fn attach(&mut self) {
        if self.attached {
            debug!("re-attaching, releasing previous strategies");
        }
        self.release_strategies();
        self.attached = true;
        self.shell.sync(self.state.phase());
        self.rebuild_intersection();
        self.rebuild_scroll();
        info!(
            threshold = self.config.threshold,
            intersection = self.intersection.is_some(),
            scroll = self.scroll.is_some(),
            "attached"
        );
    }

    /// Release every platform handle; safe to call repeatedly
    pub fn detach(&mut self) {
        self.release_strategies();
        if self.attached {
            self.attached = false;
            info!(dispatched = self.dispatched, "detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Apply a partial configuration, rebuilding only the strategies it affects
    pub fn configure(&mut self, update: ConfigUpdate) {
        let changes = self.config.apply(&update);
        if !self.attached || !changes.any() {
            return;
        }
        debug!(
            intersection = changes.intersection,
            scroll = changes.scroll,
            "configuration changed"
        );
        if changes.intersection {
            self.rebuild_intersection();
        }
        if changes.scroll {
            self.rebuild_scroll();
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn threshold(&self) -> u32 {
        self.config.threshold
    }

    // =========================================================================
    // Load state
    // =========================================================================

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.sync_presentation();
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.state.has_more = has_more;
        self.sync_presentation();
    }

    /// Show the error overlay; hides the loading indicator and sentinel
    pub fn show_error(&mut self) {
        self.state.has_error = true;
        self.sync_presentation();
    }

    /// Hide the error overlay, restoring whatever the flags call for
    pub fn hide_error(&mut self) {
        self.state.has_error = false;
        self.sync_presentation();
    }

    /// Alias of [`Coordinator::hide_error`]
    pub fn clear_error(&mut self) {
        self.hide_error();
    }

    /// Back to ready: not loading, more data, no error; strategies rebuilt
    pub fn reset(&mut self) {
        self.state = LoadState::default();
        self.sync_presentation();
        if self.attached {
            self.release_strategies();
            self.rebuild_intersection();
            self.rebuild_scroll();
        }
        debug!("reset");
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    pub fn presentation(&self) -> Presentation {
        self.shell.presentation()
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Replace the content of a host-customizable region
    pub fn set_region_content(&mut self, region: Region, content: RegionContent) -> bool {
        self.shell.set_content(region, content)
    }

    /// Scroll the content region back to its start
    pub fn scroll_to_start(&mut self) {
        if !self.attached {
            debug!("scroll_to_start ignored while detached");
            return;
        }
        self.platform.set_scroll_offset(Region::Content, 0);
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: LoadListener + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Number of `load` notifications dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    // =========================================================================
    // Platform events
    // =========================================================================

    /// Visibility callback from the platform
    ///
    /// Returns the number of `load` notifications dispatched.
    pub fn on_intersection(&mut self, observer: ObserverId, entries: &[IntersectionEntry]) -> usize {
        let detections = match &self.intersection {
            Some(strategy) if self.attached && strategy.observer() == observer => {
                strategy.detections(entries)
            }
            _ => {
                trace!(observer = observer.0, "ignoring stale intersection callback");
                return 0;
            }
        };

        (0..detections)
            .filter(|_| self.try_trigger(TriggerSource::Intersection))
            .count()
    }

    /// Scroll event from the platform; returns true if `load` was dispatched
    pub fn on_scroll(&mut self, subscription: SubscriptionId, now: Instant) -> bool {
        let run = match &mut self.scroll {
            Some(strategy) if self.attached && strategy.subscription() == subscription => {
                strategy.on_scroll(now)
            }
            _ => {
                trace!(subscription = subscription.0, "ignoring stale scroll event");
                return false;
            }
        };
        run && self.evaluate_scroll()
    }

    /// Run a deferred scroll evaluation if one is due
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self.scroll.as_mut().is_some_and(|s| s.poll(now));
        due && self.evaluate_scroll()
    }

    /// When the host should next call [`Coordinator::tick`]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scroll.as_ref().and_then(|s| s.next_deadline())
    }

    /// Handle of the active visibility observer, if any
    pub fn observer(&self) -> Option<ObserverId> {
        self.intersection.as_ref().map(|s| s.observer())
    }

    /// Handle of the active scroll subscription, if any
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.scroll.as_ref().map(|s| s.subscription())
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn evaluate_scroll(&mut self) -> bool {
        let metrics = self.platform.scroll_metrics(Region::Content);
        if !ScrollStrategy::is_near_end(&metrics, self.config.threshold) {
            trace!(
                distance = metrics.distance_to_end(),
                threshold = self.config.threshold,
                "not near end"
            );
            return false;
        }
        self.try_trigger(TriggerSource::Scroll)
    }

    /// The single gate both strategies go through
    fn try_trigger(&mut self, source: TriggerSource) -> bool {
        if !self.state.accepts_trigger() {
            trace!(%source, phase = %self.state.phase(), "trigger suppressed");
            return false;
        }

        if self.config.latch_on_dispatch {
            self.state.is_loading = true;
        }

        let event = LoadEvent::now();
        self.dispatched += 1;
        debug!(%source, timestamp = event.timestamp, "dispatching load");

        for (_, listener) in self.listeners.iter_mut() {
            listener.on_load(&event, &mut self.state);
        }

        self.sync_presentation();
        true
    }

    fn sync_presentation(&mut self) {
        let phase = self.state.phase();
        if self.shell.sync(phase) {
            trace!(%phase, "presentation updated");
        }
    }

    fn rebuild_intersection(&mut self) {
        if let Some(strategy) = self.intersection.take() {
            strategy.release(&mut self.platform);
        }
        if self.config.use_intersection {
            self.intersection =
                IntersectionStrategy::activate(&mut self.platform, self.config.threshold);
        }
    }

    fn rebuild_scroll(&mut self) {
        if let Some(strategy) = self.scroll.take() {
            strategy.release(&mut self.platform);
        }
        if self.config.use_scroll {
            self.scroll = Some(ScrollStrategy::activate(
                &mut self.platform,
                self.config.throttle_interval,
            ));
        }
    }

    fn release_strategies(&mut self) {
        if let Some(strategy) = self.intersection.take() {
            strategy.release(&mut self.platform);
        }
        if let Some(strategy) = self.scroll.take() {
            strategy.release(&mut self.platform);
        }
    }
}

impl<P: Platform> Lifecycle for Coordinator<P> {
    fn attach(&mut self) {
        Coordinator::attach(self);
    }

    fn detach(&mut self) {
        Coordinator::detach(self);
    }

    fn attribute_changed(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        attributes::apply_attribute(self, name, value)
    }
}

impl<P: Platform> Drop for Coordinator<P> {
    fn drop(&mut self) {
        self.release_strategies();
    }
}
