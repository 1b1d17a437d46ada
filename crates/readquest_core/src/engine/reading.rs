//! crates/readquest_core/src/engine/reading.rs
//!
//! Daily reading events: one call drives the streak machine and the XP
//! ledger together and returns a snapshot of the result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{StreakOutcome, UserGamification, UserId};
use crate::ports::{EngineResult, GamificationRepository};

/// XP granted for a plain reading event when the caller does not say
/// otherwise.
pub const DEFAULT_READING_XP: i64 = 10;

/// Gamification state after a reading event was applied.
#[derive(Debug, Clone, Copy)]
pub struct ReadingSnapshot {
    pub outcome: StreakOutcome,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_read_date: Option<DateTime<Utc>>,
    pub total_xp: u64,
    pub level: u32,
}

pub struct ReadingRecorder {
    gamification_repo: Arc<dyn GamificationRepository>,
}

impl ReadingRecorder {
    pub fn new(gamification_repo: Arc<dyn GamificationRepository>) -> Self {
        Self { gamification_repo }
    }

    /// Record a qualifying reading event happening now.
    pub async fn record_reading(
        &self,
        user: UserId,
        xp_amount: i64,
    ) -> EngineResult<ReadingSnapshot> {
        self.record_reading_on(user, xp_amount, Utc::now()).await
    }

    /// Record a qualifying reading event at an explicit instant. The
    /// state row is created on first contact with two streak freezes in
    /// the bank and zero XP.
    pub async fn record_reading_on(
        &self,
        user: UserId,
        xp_amount: i64,
        at: DateTime<Utc>,
    ) -> EngineResult<ReadingSnapshot> {
        let mut gamification = match self.gamification_repo.find(user).await? {
            Some(existing) => existing,
            None => UserGamification::new(user, at),
        };

        let outcome = gamification.record_reading(at);
        gamification.add_xp(xp_amount, at);
        self.gamification_repo.save(&gamification).await?;

        debug!(
            user = %user,
            outcome = outcome.as_str(),
            streak = gamification.streak.current(),
            freezes = gamification.streak_freeze_count,
            total_xp = gamification.xp.total(),
            "recorded reading event"
        );

        Ok(ReadingSnapshot {
            outcome,
            current_streak: gamification.streak.current(),
            longest_streak: gamification.streak.longest(),
            streak_freezes: gamification.streak_freeze_count,
            last_read_date: gamification.last_read_date,
            total_xp: gamification.xp.total(),
            level: gamification.xp.level(),
        })
    }
}
