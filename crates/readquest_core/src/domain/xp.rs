//! crates/readquest_core/src/domain/xp.rs
//!
//! Experience points and the quadratic leveling curve. Level `L` spans the
//! cumulative XP range `[(L-1)^2 * 100, L^2 * 100)`, so each level costs
//! progressively more than the last.

/// Cost scale of the leveling curve: level `L` begins at `(L-1)^2 * 100` XP.
const LEVEL_XP_SCALE: u64 = 100;

/// Monotonically accumulating experience total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Xp(u64);

impl Xp {
    pub const ZERO: Self = Xp(0);

    pub fn from_total(total: u64) -> Self {
        Xp(total)
    }

    pub fn total(&self) -> u64 {
        self.0
    }

    /// Add an amount to the total. Negative amounts are ignored so the
    /// total never decreases.
    pub fn add(&mut self, amount: i64) {
        if amount > 0 {
            self.0 = self.0.saturating_add(amount as u64);
        }
    }

    /// Current level: `floor(sqrt(total / 100)) + 1`. Level 1 at 0 XP.
    pub fn level(&self) -> u32 {
        ((self.0 / LEVEL_XP_SCALE) as f64).sqrt() as u32 + 1
    }

    /// XP still needed to reach the next level.
    pub fn xp_for_next_level(&self) -> u64 {
        Self::level_floor(self.level() + 1).saturating_sub(self.0)
    }

    /// Percentage of the way from the current level to the next, 0..=100.
    pub fn progress_to_next_level(&self) -> u8 {
        let level = self.level();
        let floor = Self::level_floor(level);
        let span = Self::level_floor(level + 1) - floor;
        let into = self.0.saturating_sub(floor);
        ((into * 100 / span).min(100)) as u8
    }

    /// Cumulative XP at which `level` begins: `(level - 1)^2 * 100`.
    fn level_floor(level: u32) -> u64 {
        let base = level.saturating_sub(1) as u64;
        base * base * LEVEL_XP_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_one_at_zero_xp() {
        assert_eq!(Xp::ZERO.level(), 1);
    }

    #[test]
    fn test_level_boundaries() {
        // Level 2 begins at 100, level 3 at 400, level 4 at 900.
        assert_eq!(Xp::from_total(99).level(), 1);
        assert_eq!(Xp::from_total(100).level(), 2);
        assert_eq!(Xp::from_total(399).level(), 2);
        assert_eq!(Xp::from_total(400).level(), 3);
        assert_eq!(Xp::from_total(900).level(), 4);
    }

    #[test]
    fn test_add_ignores_negative_amounts() {
        let mut xp = Xp::from_total(50);
        xp.add(-20);
        assert_eq!(xp.total(), 50);
        xp.add(0);
        assert_eq!(xp.total(), 50);
        xp.add(25);
        assert_eq!(xp.total(), 75);
    }

    #[test]
    fn test_xp_for_next_level() {
        assert_eq!(Xp::ZERO.xp_for_next_level(), 100);
        assert_eq!(Xp::from_total(30).xp_for_next_level(), 70);
        // At level 2 (100..400), the next threshold is 400.
        assert_eq!(Xp::from_total(150).xp_for_next_level(), 250);
    }

    #[test]
    fn test_progress_to_next_level_is_clamped() {
        assert_eq!(Xp::ZERO.progress_to_next_level(), 0);
        assert_eq!(Xp::from_total(50).progress_to_next_level(), 50);
        // Level 2 spans 100..400; 250 is halfway.
        assert_eq!(Xp::from_total(250).progress_to_next_level(), 50);
        assert!(Xp::from_total(399).progress_to_next_level() <= 100);
    }

    #[test]
    fn test_level_never_decreases_as_xp_grows() {
        let mut last_level = 0;
        for total in (0..5_000).step_by(37) {
            let level = Xp::from_total(total).level();
            assert!(level >= last_level, "level dropped at {total} XP");
            last_level = level;
        }
    }
}
