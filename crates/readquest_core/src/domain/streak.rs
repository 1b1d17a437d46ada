//! crates/readquest_core/src/domain/streak.rs

/// Consecutive-day reading streak counters.
///
/// `longest` is a high-water mark: it never decreases and always satisfies
/// `longest >= current`. Both counters only move through the methods below,
/// so a `Streak` can never be observed in a violating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    current: u32,
    longest: u32,
}

impl Streak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted counters, repairing `longest < current` if a
    /// stale row ever produced one.
    pub fn from_counts(current: u32, longest: u32) -> Self {
        Self {
            current,
            longest: longest.max(current),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    /// Begin a fresh one-day run.
    pub(crate) fn restart(&mut self) {
        self.current = 1;
        self.longest = self.longest.max(1);
    }

    /// Extend the run by one day.
    pub(crate) fn extend(&mut self) {
        self.current = self.current.saturating_add(1);
        self.longest = self.longest.max(self.current);
    }
}
