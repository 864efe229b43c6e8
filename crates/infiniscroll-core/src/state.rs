//! Load state and its effective phase
//!
//! The host drives `LoadState`; `Phase` is derived from it and decides both
//! what is shown and whether triggers may dispatch.

/// Host-driven load flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadState {
    /// A load notification is outstanding
    pub is_loading: bool,
    /// The host has more data to offer
    pub has_more: bool,
    /// The host reported a load failure
    pub has_error: bool,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            is_loading: false,
            has_more: true,
            has_error: false,
        }
    }
}

impl LoadState {
    /// Effective phase: error over loading over exhausted over ready
    pub fn phase(&self) -> Phase {
        if self.has_error {
            Phase::Error
        } else if self.is_loading {
            Phase::Loading
        } else if !self.has_more {
            Phase::Exhausted
        } else {
            Phase::Ready
        }
    }

    /// The trigger gate: not loading and more data available
    ///
    /// A visible error also suppresses triggers until the host clears it.
    pub fn accepts_trigger(&self) -> bool {
        !self.is_loading && self.has_more && !self.has_error
    }
}

/// Effective presentation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sentinel active, triggers accepted
    Ready,
    /// Waiting on the host; loading indicator shown
    Loading,
    /// Host declared no more data; end indicator shown
    Exhausted,
    /// Host reported a failure; error indicator shown
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Loading => "loading",
            Phase::Exhausted => "exhausted",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
