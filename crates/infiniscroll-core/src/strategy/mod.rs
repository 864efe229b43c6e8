//! Detection strategies
//!
//! Each strategy owns exactly one platform handle. Strategies are built by
//! `activate` and torn down by `release`; a configuration change that affects
//! one is handled by releasing it and activating a fresh one.

mod intersection;
mod scroll;

pub use intersection::IntersectionStrategy;
pub use scroll::ScrollStrategy;

/// Which strategy detected the trigger condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    Intersection,
    Scroll,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Intersection => f.write_str("intersection"),
            TriggerSource::Scroll => f.write_str("scroll"),
        }
    }
}
