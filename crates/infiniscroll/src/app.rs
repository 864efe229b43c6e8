//! Application state and main loop
//!
//! The app owns the coordinator and routes three event sources into it:
//! terminal input, feed responses and the throttle deadline.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use infiniscroll_core::{ConfigUpdate, Coordinator, LoadEvent, LoadState, Phase};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::feed::{spawn_feed, FeedEvent, FeedRequest};
use crate::platform::{PlatformEvent, TerminalPlatform};
use crate::ui;

/// Poll interval when no throttle deadline is pending
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Upper bound on event delivery rounds per pump
const MAX_PUMP_ROUNDS: usize = 8;

/// Rows moved by PageUp / PageDown when the viewport is unknown
const FALLBACK_PAGE_ROWS: i64 = 10;

/// Rows moved per mouse wheel notch
const WHEEL_ROWS: i64 = 3;

pub struct App {
    pub(crate) coordinator: Coordinator<TerminalPlatform>,
    pub(crate) items: Vec<String>,
    pub(crate) last_error: Option<String>,
    feed_tx: mpsc::UnboundedSender<FeedRequest>,
    feed_rx: mpsc::UnboundedReceiver<FeedEvent>,
    generation: u64,
    should_quit: bool,
    needs_redraw: bool,
}

impl App {
    /// Build the app and start the feed task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(coordinator: Coordinator<TerminalPlatform>, config: &HostConfig) -> Self {
        let (feed_tx, feed_rx) = spawn_feed(config.feed.clone());
        let mut coordinator = coordinator;

        let tx = feed_tx.clone();
        coordinator.add_listener(move |event: &LoadEvent, state: &mut LoadState| {
            debug!(timestamp = event.timestamp, "Requesting next page");
            state.is_loading = true;
            if tx.send(FeedRequest::NextPage).is_err() {
                warn!("Feed task is gone");
                state.is_loading = false;
                state.has_error = true;
            }
        });

        Self {
            coordinator,
            items: Vec::new(),
            last_error: None,
            feed_tx,
            feed_rx,
            generation: 0,
            should_quit: false,
            needs_redraw: true,
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.coordinator.attach();
        let result = self.main_loop(&mut terminal).await;
        self.coordinator.detach();

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result
    }

    /// Main event loop
    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        loop {
            if self.needs_redraw {
                terminal.draw(|f| ui::render(f, self))?;
                self.needs_redraw = false;
            }

            // Viewport size is only known after a draw
            self.pump(Instant::now());

            let timeout = self
                .coordinator
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .map_or(IDLE_POLL, |wait| wait.min(IDLE_POLL));

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_terminal_event(event),
                        Some(Err(e)) => warn!(error = %e, "Terminal event error"),
                        None => self.should_quit = true,
                    }
                }
                Some(event) = self.feed_rx.recv() => {
                    self.handle_feed_event(event);
                }
                _ = tokio::time::sleep(timeout) => {}
            }

            if self.coordinator.tick(Instant::now()) {
                self.needs_redraw = true;
            }

            if self.should_quit {
                info!(items = self.items.len(), "Quitting");
                break;
            }
        }
        Ok(())
    }

    /// Deliver queued platform callbacks to the coordinator
    ///
    /// Dispatching can change what is presented (the sentinel hides while
    /// loading), which in turn produces new visibility callbacks; rounds
    /// continue until the platform is quiet.
    pub(crate) fn pump(&mut self, now: Instant) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let shown = self.coordinator.presentation().sentinel_visible;
            let platform = self.coordinator.platform_mut();
            platform.set_sentinel_shown(shown);
            platform.refresh();
            let events = platform.drain_events();
            if events.is_empty() {
                return;
            }

            for event in events {
                match event {
                    PlatformEvent::Intersection(observer, entries) => {
                        self.coordinator.on_intersection(observer, &entries);
                    }
                    PlatformEvent::Scroll(subscription) => {
                        self.coordinator.on_scroll(subscription, now);
                    }
                }
            }
            self.needs_redraw = true;
        }
        debug!("Platform still busy after {} rounds", MAX_PUMP_ROUNDS);
    }

    pub(crate) fn set_viewport_rows(&mut self, rows: u16) {
        let platform = self.coordinator.platform_mut();
        if platform.geometry().viewport_rows != u32::from(rows) {
            platform.set_viewport_rows(u32::from(rows));
        }
    }

    // =========================================================================
    // Feed
    // =========================================================================

    pub(crate) fn handle_feed_event(&mut self, event: FeedEvent) {
        self.needs_redraw = true;
        match event {
            FeedEvent::Page {
                generation,
                items,
                has_more,
            } => {
                if generation != self.generation {
                    debug!(generation, "Dropping page from before reset");
                    return;
                }
                info!(count = items.len(), has_more, "Page received");
                self.items.extend(items);
                self.last_error = None;
                let rows = self.content_rows();
                self.coordinator.platform_mut().set_content_rows(rows);
                self.coordinator.set_has_more(has_more);
                self.coordinator.set_loading(false);
            }
            FeedEvent::Failed {
                generation,
                message,
            } => {
                if generation != self.generation {
                    return;
                }
                warn!(error = %message, "Page request failed");
                self.last_error = Some(message);
                self.coordinator.show_error();
                self.coordinator.set_loading(false);
            }
        }
    }

    fn content_rows(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    // =========================================================================
    // Input
    // =========================================================================

    fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(_, _) => self.needs_redraw = true,
            _ => {}
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        self.needs_redraw = true;
        let viewport = i64::from(self.coordinator.platform().geometry().viewport_rows);
        let page = if viewport > 0 {
            viewport
        } else {
            FALLBACK_PAGE_ROWS
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(page),
            KeyCode::PageUp => self.scroll_by(-page),
            KeyCode::End | KeyCode::Char('G') => self.scroll_by(i64::from(u32::MAX)),
            KeyCode::Home | KeyCode::Char('g') => self.coordinator.scroll_to_start(),
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('R') => self.reset(),
            KeyCode::Char('s') => {
                let enabled = !self.coordinator.config().use_scroll;
                self.coordinator
                    .configure(ConfigUpdate::new().use_scroll(enabled));
            }
            KeyCode::Char('i') => {
                let enabled = !self.coordinator.config().use_intersection;
                self.coordinator
                    .configure(ConfigUpdate::new().use_intersection(enabled));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let threshold = self.coordinator.threshold().saturating_add(1);
                self.coordinator
                    .configure(ConfigUpdate::new().threshold(threshold));
            }
            KeyCode::Char('-') => {
                let threshold = self.coordinator.threshold().saturating_sub(1);
                self.coordinator
                    .configure(ConfigUpdate::new().threshold(threshold));
            }
            _ => self.needs_redraw = false,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_ROWS),
            _ => return,
        }
        self.needs_redraw = true;
    }

    fn scroll_by(&mut self, delta: i64) {
        self.coordinator.platform_mut().scroll_by(delta);
    }

    /// Leave the error phase so detection can ask again
    fn retry(&mut self) {
        if self.coordinator.phase() == Phase::Error {
            info!("Retrying after error");
            self.last_error = None;
            self.coordinator.hide_error();
        }
    }

    /// Drop everything loaded and start the feed over
    fn reset(&mut self) {
        info!(items = self.items.len(), "Resetting list");
        self.items.clear();
        self.last_error = None;
        self.generation += 1;
        if self.feed_tx.send(FeedRequest::Restart).is_err() {
            warn!("Feed task is gone");
        }
        self.coordinator.platform_mut().set_content_rows(0);
        self.coordinator.scroll_to_start();
        self.coordinator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crossterm::event::KeyModifiers;
    use infiniscroll_core::Config;

    fn host_config(total_items: usize, failure_rate: f64) -> HostConfig {
        HostConfig {
            detection: Config::default(),
            feed: FeedConfig {
                page_size: 20,
                total_items,
                latency_ms: 0,
                failure_rate,
            },
        }
    }

    fn app(total_items: usize, failure_rate: f64) -> App {
        let config = host_config(total_items, failure_rate);
        let coordinator = Coordinator::new(TerminalPlatform::new(), config.detection.clone());
        let mut app = App::new(coordinator, &config);
        app.set_viewport_rows(10);
        app.coordinator.attach();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn deliver_next(app: &mut App) {
        let event = app.feed_rx.recv().await.unwrap();
        app.handle_feed_event(event);
        app.pump(Instant::now());
    }

    #[tokio::test]
    async fn test_empty_list_requests_first_page() {
        let mut app = app(100, 0.0);
        app.pump(Instant::now());

        assert_eq!(app.coordinator.dispatched(), 1);
        assert_eq!(app.coordinator.phase(), Phase::Loading);

        deliver_next(&mut app).await;
        assert_eq!(app.items.len(), 20);
        assert_eq!(app.coordinator.phase(), Phase::Ready);
        // Sentinel is below the viewport now
        assert_eq!(app.coordinator.dispatched(), 1);
    }

    #[tokio::test]
    async fn test_scrolling_to_bottom_requests_once() {
        let mut app = app(100, 0.0);
        app.pump(Instant::now());
        deliver_next(&mut app).await;

        app.handle_key(key(KeyCode::End));
        app.pump(Instant::now());

        // Scroll and visibility both fire; only one request goes out
        assert_eq!(app.coordinator.dispatched(), 2);
        assert!(app.coordinator.is_loading());
    }

    #[tokio::test]
    async fn test_exhausted_feed_stops_requests() {
        let mut app = app(20, 0.0);
        app.pump(Instant::now());
        deliver_next(&mut app).await;
        assert_eq!(app.coordinator.phase(), Phase::Exhausted);

        app.handle_key(key(KeyCode::End));
        app.pump(Instant::now());
        assert_eq!(app.coordinator.dispatched(), 1);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let mut app = app(100, 1.0);
        app.pump(Instant::now());
        deliver_next(&mut app).await;

        assert_eq!(app.coordinator.phase(), Phase::Error);
        assert!(app.last_error.is_some());
        assert!(app.items.is_empty());

        app.handle_key(key(KeyCode::Char('r')));
        app.pump(Instant::now());
        assert_eq!(app.coordinator.dispatched(), 2);
    }

    #[tokio::test]
    async fn test_reset_drops_items_and_stale_pages() {
        let mut app = app(100, 0.0);
        app.pump(Instant::now());
        deliver_next(&mut app).await;
        assert_eq!(app.items.len(), 20);

        app.handle_key(key(KeyCode::Char('R')));
        assert!(app.items.is_empty());
        assert_eq!(app.coordinator.phase(), Phase::Ready);

        // A page answered for the old generation is ignored
        app.handle_feed_event(FeedEvent::Page {
            generation: 0,
            items: vec!["stale".to_string()],
            has_more: true,
        });
        assert!(app.items.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_and_threshold_keys() {
        let mut app = app(100, 0.0);
        app.handle_key(key(KeyCode::Char('s')));
        assert!(!app.coordinator.config().use_scroll);
        assert!(app.coordinator.subscription().is_none());

        app.handle_key(key(KeyCode::Char('+')));
        app.handle_key(key(KeyCode::Char('+')));
        app.handle_key(key(KeyCode::Char('-')));
        assert_eq!(app.coordinator.threshold(), 1);
    }

    #[tokio::test]
    async fn test_quit_key() {
        let mut app = app(100, 0.0);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
