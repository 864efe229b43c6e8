//! Trailing-edge throttle
//!
//! At most one real invocation per `delay` window. A call made inside the
//! window schedules a single deferred invocation at the end of the window;
//! a later call inside the same window replaces the scheduled value, so only
//! the most recent one survives.
//!
//! Time is passed in explicitly. The owner drives deferred invocations by
//! calling `poll` at or after `next_deadline`.

use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, Clone)]
struct Pending<T> {
    deadline: Instant,
    value: T,
}

/// Throttle state for values of type `T`
///
/// `call` and `poll` hand back the value to run instead of running it, so the
/// caller keeps ownership of whatever the invocation needs.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    delay: Duration,
    last_invocation: Option<Instant>,
    pending: Option<Pending<T>>,
}

impl<T> Throttle<T> {
    /// Create a throttle with the given window
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_invocation: None,
            pending: None,
        }
    }

    /// Window length
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time of the last real invocation, if any
    pub fn last_invocation(&self) -> Option<Instant> {
        self.last_invocation
    }

    /// Submit a call at `now`
    ///
    /// Returns the value when it should run immediately; otherwise it is
    /// held until the end of the current window.
    pub fn call(&mut self, now: Instant, value: T) -> Option<T> {
        match self.last_invocation {
            Some(last) if now.saturating_duration_since(last) <= self.delay => {
                let deadline = last + self.delay;
                if self.pending.replace(Pending { deadline, value }).is_some() {
                    trace!("throttle: superseded pending call");
                }
                None
            }
            _ => {
                // Anything still pending belongs to an older window
                self.pending = None;
                self.last_invocation = Some(now);
                Some(value)
            }
        }
    }

    /// Release the deferred value if its deadline has been reached
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| p.deadline <= now);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_invocation = Some(now);
        Some(pending.value)
    }

    /// When the deferred value is due, if one is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether a deferred invocation is scheduled
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the deferred value without running it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// A function wrapped in a [`Throttle`]
pub struct Throttled<F, T> {
    func: F,
    state: Throttle<T>,
}

impl<F, T> Throttled<F, T>
where
    F: FnMut(T),
{
    pub fn new(func: F, delay: Duration) -> Self {
        Self {
            func,
            state: Throttle::new(delay),
        }
    }

    /// Invoke now or schedule for the end of the window
    pub fn call(&mut self, now: Instant, arg: T) {
        if let Some(arg) = self.state.call(now, arg) {
            (self.func)(arg);
        }
    }

    /// Run the deferred invocation if due; returns true if it ran
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state.poll(now) {
            Some(arg) => {
                (self.func)(arg);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.next_deadline()
    }

    pub fn cancel(&mut self) {
        self.state.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_call_runs_immediately() {
        let t = Instant::now();
        let mut throttle = Throttle::new(DELAY);
        assert_eq!(throttle.call(t, 1), Some(1));
        assert_eq!(throttle.last_invocation(), Some(t));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_calls_inside_window_collapse_to_one_trailing_call() {
        let t = Instant::now();
        let mut throttle = Throttle::new(DELAY);

        assert_eq!(throttle.call(t, "t"), Some("t"));
        assert_eq!(throttle.call(t + ms(5), "t+5"), None);
        assert_eq!(throttle.call(t + ms(50), "t+50"), None);
        assert_eq!(throttle.next_deadline(), Some(t + ms(100)));

        assert_eq!(throttle.poll(t + ms(99)), None);
        assert_eq!(throttle.poll(t + ms(100)), Some("t+50"));
        // Nothing left over
        assert_eq!(throttle.poll(t + ms(500)), None);
        assert_eq!(throttle.last_invocation(), Some(t + ms(100)));
    }

    #[test]
    fn test_call_after_window_runs_immediately_and_drops_stale_pending() {
        let t = Instant::now();
        let mut throttle = Throttle::new(DELAY);

        throttle.call(t, 1);
        throttle.call(t + ms(10), 2);
        assert!(throttle.has_pending());

        // Owner never polled; a fresh window starts
        assert_eq!(throttle.call(t + ms(150), 3), Some(3));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let t = Instant::now();
        let mut throttle = Throttle::new(DELAY);

        throttle.call(t, 1);
        assert_eq!(throttle.call(t + DELAY, 2), None);
        assert_eq!(throttle.poll(t + DELAY), Some(2));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let t = Instant::now();
        let mut throttle = Throttle::new(DELAY);

        throttle.call(t, 1);
        throttle.call(t + ms(20), 2);
        throttle.cancel();
        assert_eq!(throttle.poll(t + ms(200)), None);
        assert_eq!(throttle.next_deadline(), None);
    }

    #[test]
    fn test_throttled_function_wrapper() {
        let t = Instant::now();
        let mut seen = Vec::new();
        {
            let mut throttled = Throttled::new(|v: u32| seen.push(v), DELAY);
            throttled.call(t, 0);
            throttled.call(t + ms(5), 5);
            throttled.call(t + ms(50), 50);
            assert!(!throttled.poll(t + ms(60)));
            assert!(throttled.poll(t + ms(100)));
        }
        assert_eq!(seen, vec![0, 50]);
    }
}
