//! crates/readquest_core/src/domain/gamification.rs
//!
//! Per-user streak and experience aggregate, and the calendar-day
//! arithmetic the streak machine runs on.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::ids::UserId;
use crate::domain::streak::Streak;
use crate::domain::xp::Xp;

/// Streak freezes a fresh account starts with.
pub const DEFAULT_STREAK_FREEZES: u32 = 2;

/// The exact gap (in calendar days) a single freeze can forgive: one read
/// day, one skipped day, then the current read day.
const FREEZE_GAP_DAYS: i64 = 2;

/// Calendar-day difference `later - earlier`.
///
/// This works on dates, not 24-hour intervals: 23:59 one day to 00:01 the
/// next is one day, so streak thresholds hold across midnight regardless
/// of the time of day either read happened.
pub fn day_diff(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// What a `record_reading` call did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// First qualifying read ever recorded for this user.
    Started,
    /// Another read within the same calendar day; nothing moved.
    SameDay,
    /// Consecutive calendar day; the streak grew by one.
    Extended,
    /// Exactly one missed day, forgiven by consuming a freeze.
    Frozen,
    /// The gap was too large (or no freeze was left); restarted at one.
    Reset,
}

impl StreakOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakOutcome::Started => "started",
            StreakOutcome::SameDay => "same_day",
            StreakOutcome::Extended => "extended",
            StreakOutcome::Frozen => "frozen",
            StreakOutcome::Reset => "reset",
        }
    }
}

/// Per-user streak and experience aggregate. At most one exists per user;
/// it is created on the first reading event (or onboarding completion) and
/// never deleted while the user exists.
#[derive(Debug, Clone)]
pub struct UserGamification {
    pub user_id: UserId,
    pub streak: Streak,
    /// Raw timestamp of the last qualifying read. Comparisons strip the
    /// time of day; the stored value keeps the caller's full precision.
    pub last_read_date: Option<DateTime<Utc>>,
    pub streak_freeze_count: u32,
    pub xp: Xp,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserGamification {
    /// Factory for a user's first reading event: two freezes in the bank,
    /// nothing else.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            streak: Streak::new(),
            last_read_date: None,
            streak_freeze_count: DEFAULT_STREAK_FREEZES,
            xp: Xp::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the streak machine for a qualifying read at `at`.
    ///
    /// Branches on the calendar-day gap since the last read:
    /// none yet → start at one; same day → unchanged; next day → extend;
    /// a two-day gap consumes a freeze if one is available; any other
    /// gap (longer, or backwards from clock skew) resets. The stored
    /// timestamp is always replaced with `at`.
    pub fn record_reading(&mut self, at: DateTime<Utc>) -> StreakOutcome {
        let outcome = match self.last_read_date {
            None => {
                self.streak.restart();
                StreakOutcome::Started
            }
            Some(last) => match day_diff(last.date_naive(), at.date_naive()) {
                0 => StreakOutcome::SameDay,
                1 => {
                    self.streak.extend();
                    StreakOutcome::Extended
                }
                FREEZE_GAP_DAYS if self.streak_freeze_count > 0 => {
                    self.streak_freeze_count -= 1;
                    StreakOutcome::Frozen
                }
                _ => {
                    self.streak.restart();
                    StreakOutcome::Reset
                }
            },
        };
        self.last_read_date = Some(at);
        self.updated_at = at;
        outcome
    }

    /// Add to the experience total; negative amounts are ignored.
    pub fn add_xp(&mut self, amount: i64, now: DateTime<Utc>) {
        self.xp.add(amount);
        self.updated_at = now;
    }

    /// Spend one freeze from the manual budget. Returns false when the
    /// budget is empty.
    pub fn use_streak_freeze(&mut self, now: DateTime<Utc>) -> bool {
        if self.streak_freeze_count == 0 {
            return false;
        }
        self.streak_freeze_count -= 1;
        self.updated_at = now;
        true
    }

    /// Top the freeze budget back up (purchases, reward flows).
    pub fn replenish_streak_freezes(&mut self, count: u32, now: DateTime<Utc>) {
        self.streak_freeze_count = self.streak_freeze_count.saturating_add(count);
        self.updated_at = now;
    }
}
