//! crates/readquest_core/src/engine/stats.rs
//!
//! Read-only stat surfaces: one per user, one platform-wide.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{UserGamification, UserId};
use crate::ports::{EngineResult, GamificationRepository, UserAchievementRepository};

#[derive(Debug, Clone, Copy)]
pub struct UserStats {
    pub level: u32,
    pub total_xp: u64,
    pub xp_for_next_level: u64,
    pub progress_to_next_level: u8,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_read_date: Option<DateTime<Utc>>,
    pub achievements_unlocked: u64,
    pub achievements_in_progress: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobalStats {
    pub readers: u64,
    pub total_xp: u64,
    pub longest_streak: u32,
    pub achievements_unlocked: u64,
}

pub struct StatsReporter {
    gamification_repo: Arc<dyn GamificationRepository>,
    user_achievement_repo: Arc<dyn UserAchievementRepository>,
}

impl StatsReporter {
    pub fn new(
        gamification_repo: Arc<dyn GamificationRepository>,
        user_achievement_repo: Arc<dyn UserAchievementRepository>,
    ) -> Self {
        Self {
            gamification_repo,
            user_achievement_repo,
        }
    }

    /// Stats for one user. A user with no recorded activity gets the
    /// constructor defaults (level 1, two freezes) without a row being
    /// written.
    pub async fn user_stats(&self, user: UserId) -> EngineResult<UserStats> {
        let gamification = self
            .gamification_repo
            .find(user)
            .await?
            .unwrap_or_else(|| UserGamification::new(user, Utc::now()));

        let achievements_unlocked = self.user_achievement_repo.count_unlocked(user).await?;
        let achievements_in_progress = self
            .user_achievement_repo
            .list_for_user(user)
            .await?
            .iter()
            .filter(|row| !row.is_unlocked && row.progress > 0)
            .count() as u64;

        Ok(UserStats {
            level: gamification.xp.level(),
            total_xp: gamification.xp.total(),
            xp_for_next_level: gamification.xp.xp_for_next_level(),
            progress_to_next_level: gamification.xp.progress_to_next_level(),
            current_streak: gamification.streak.current(),
            longest_streak: gamification.streak.longest(),
            streak_freezes: gamification.streak_freeze_count,
            last_read_date: gamification.last_read_date,
            achievements_unlocked,
            achievements_in_progress,
        })
    }

    pub async fn global_stats(&self) -> EngineResult<GlobalStats> {
        let aggregate = self.gamification_repo.aggregate().await?;
        let achievements_unlocked = self.user_achievement_repo.count_unlocked_all().await?;

        Ok(GlobalStats {
            readers: aggregate.readers,
            total_xp: aggregate.total_xp,
            longest_streak: aggregate.longest_streak,
            achievements_unlocked,
        })
    }
}
