//! Presentation shell
//!
//! The shell is what `attach` builds: the content region, the sentinel, and
//! three overlays (loading, end, error). Each overlay carries replaceable
//! content; which of them is visible is derived from the current [`Phase`].

use crate::constants::regions::{DEFAULT_END, DEFAULT_ERROR, DEFAULT_LOADING};
use crate::platform::Region;
use crate::state::Phase;

/// Content of a host-customizable region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionContent {
    /// Built-in content for the region
    Default,
    /// Host-provided replacement
    Custom(String),
}

/// Visibility of each state-dependent part of the shell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presentation {
    pub loading_visible: bool,
    pub end_visible: bool,
    pub error_visible: bool,
    pub sentinel_visible: bool,
}

impl Presentation {
    /// Visibility for a phase; the sentinel only shows when ready
    pub fn for_phase(phase: Phase) -> Self {
        Self {
            loading_visible: phase == Phase::Loading,
            end_visible: phase == Phase::Exhausted,
            error_visible: phase == Phase::Error,
            sentinel_visible: phase == Phase::Ready,
        }
    }

    /// Whether `region` is currently shown
    pub fn is_visible(&self, region: Region) -> bool {
        match region {
            Region::Content => true,
            Region::Sentinel => self.sentinel_visible,
            Region::Loading => self.loading_visible,
            Region::End => self.end_visible,
            Region::Error => self.error_visible,
        }
    }
}

/// The rendered shell
#[derive(Debug, Clone)]
pub struct Shell {
    content: RegionContent,
    loading: RegionContent,
    end: RegionContent,
    error: RegionContent,
    presentation: Presentation,
}

impl Shell {
    /// Build the shell in the given phase
    pub fn new(phase: Phase) -> Self {
        Self {
            content: RegionContent::Default,
            loading: RegionContent::Default,
            end: RegionContent::Default,
            error: RegionContent::Default,
            presentation: Presentation::for_phase(phase),
        }
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Recompute visibility; returns true if anything changed
    pub fn sync(&mut self, phase: Phase) -> bool {
        let next = Presentation::for_phase(phase);
        let changed = next != self.presentation;
        self.presentation = next;
        changed
    }

    /// Replace a region's content; the sentinel has none
    pub fn set_content(&mut self, region: Region, content: RegionContent) -> bool {
        match region {
            Region::Content => self.content = content,
            Region::Loading => self.loading = content,
            Region::End => self.end = content,
            Region::Error => self.error = content,
            Region::Sentinel => return false,
        }
        true
    }

    pub fn content(&self, region: Region) -> Option<&RegionContent> {
        match region {
            Region::Content => Some(&self.content),
            Region::Loading => Some(&self.loading),
            Region::End => Some(&self.end),
            Region::Error => Some(&self.error),
            Region::Sentinel => None,
        }
    }

    /// Text to show for an overlay, falling back to the built-in default
    pub fn overlay_text(&self, region: Region) -> Option<&str> {
        let (content, default) = match region {
            Region::Loading => (&self.loading, DEFAULT_LOADING),
            Region::End => (&self.end, DEFAULT_END),
            Region::Error => (&self.error, DEFAULT_ERROR),
            Region::Content | Region::Sentinel => return None,
        };
        Some(match content {
            RegionContent::Default => default,
            RegionContent::Custom(text) => text.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_overlay_or_sentinel_per_phase() {
        for phase in [Phase::Ready, Phase::Loading, Phase::Exhausted, Phase::Error] {
            let p = Presentation::for_phase(phase);
            let shown = [
                p.loading_visible,
                p.end_visible,
                p.error_visible,
                p.sentinel_visible,
            ]
            .iter()
            .filter(|v| **v)
            .count();
            assert_eq!(shown, 1, "phase {phase}");
        }
    }

    #[test]
    fn test_sync_reports_changes() {
        let mut shell = Shell::new(Phase::Ready);
        assert!(shell.presentation().sentinel_visible);
        assert!(!shell.sync(Phase::Ready));
        assert!(shell.sync(Phase::Loading));
        assert!(shell.presentation().is_visible(Region::Loading));
        assert!(!shell.presentation().is_visible(Region::Sentinel));
    }

    #[test]
    fn test_overlay_text_defaults_and_overrides() {
        let mut shell = Shell::new(Phase::Ready);
        assert_eq!(shell.overlay_text(Region::End), Some(DEFAULT_END));

        assert!(shell.set_content(Region::End, RegionContent::Custom("That's all".into())));
        assert_eq!(shell.overlay_text(Region::End), Some("That's all"));

        assert!(!shell.set_content(Region::Sentinel, RegionContent::Custom("x".into())));
        assert_eq!(shell.overlay_text(Region::Content), None);
    }
}
