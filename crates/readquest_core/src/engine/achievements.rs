//! crates/readquest_core/src/engine/achievements.rs
//!
//! Achievement orchestration: progress application with explicit unlock,
//! reward payout, and the catalog-plus-user overview.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    Achievement, AchievementCode, AchievementId, UserAchievement, UserGamification, UserId,
};
use crate::ports::{
    AchievementRepository, EngineError, EngineResult, GamificationRepository, RequirementEvaluator,
    ThresholdEvaluator, UserAchievementRepository,
};

/// Result of applying progress toward one achievement.
#[derive(Debug, Clone, Copy)]
pub struct UnlockOutcome {
    pub unlocked: bool,
    /// True only on the call that flipped the unlock.
    pub newly_unlocked: bool,
    pub progress: u32,
}

/// One catalog entry joined with the user's progress toward it.
#[derive(Debug, Clone)]
pub struct AchievementOverviewEntry {
    pub achievement: Achievement,
    pub progress: u32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub near_completion: bool,
}

pub struct AchievementEngine {
    achievement_repo: Arc<dyn AchievementRepository>,
    user_achievement_repo: Arc<dyn UserAchievementRepository>,
    gamification_repo: Arc<dyn GamificationRepository>,
    evaluator: Arc<dyn RequirementEvaluator>,
}

impl AchievementEngine {
    /// Build with the stock threshold evaluator.
    pub fn new(
        achievement_repo: Arc<dyn AchievementRepository>,
        user_achievement_repo: Arc<dyn UserAchievementRepository>,
        gamification_repo: Arc<dyn GamificationRepository>,
    ) -> Self {
        Self {
            achievement_repo,
            user_achievement_repo,
            gamification_repo,
            evaluator: Arc::new(ThresholdEvaluator),
        }
    }

    /// Swap in a bespoke evaluator for custom requirement kinds.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn RequirementEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Apply a progress delta toward the achievement named by `code` and
    /// unlock it when the requirement is met.
    ///
    /// An unknown code is `NotFound`. An inactive achievement accepts no
    /// progress: the call succeeds and reports whatever was already
    /// persisted. Once unlocked, further calls are no-ops. The reward XP
    /// is paid to the user's gamification state exactly once, on the call
    /// that flips the unlock.
    pub async fn apply_progress(
        &self,
        user: UserId,
        code: &AchievementCode,
        delta: i64,
    ) -> EngineResult<UnlockOutcome> {
        let achievement = self
            .achievement_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("achievement {code}")))?;

        if !achievement.is_active {
            let progress = self
                .user_achievement_repo
                .find(user, achievement.id)
                .await?
                .map(|row| row.progress)
                .unwrap_or(0);
            return Ok(UnlockOutcome {
                unlocked: false,
                newly_unlocked: false,
                progress,
            });
        }

        let now = Utc::now();
        let mut row = match self.user_achievement_repo.find(user, achievement.id).await? {
            Some(existing) => existing,
            None => UserAchievement::new(user, achievement.id, now),
        };

        if row.is_unlocked {
            return Ok(UnlockOutcome {
                unlocked: true,
                newly_unlocked: false,
                progress: row.progress,
            });
        }

        // Negative deltas are dropped; progress only moves forward.
        let delta = u32::try_from(delta.max(0)).unwrap_or(u32::MAX);
        row.increment_progress(delta, now);

        let mut newly_unlocked = false;
        if self
            .evaluator
            .is_satisfied(&achievement.requirement, row.progress)
        {
            newly_unlocked = row.unlock(achievement.xp_reward, now);
        }

        self.user_achievement_repo.save(&row).await?;

        if newly_unlocked {
            self.award_reward(user, achievement.xp_reward, now).await?;
            info!(
                user = %user,
                code = %achievement.code,
                reward_xp = achievement.xp_reward,
                "achievement unlocked"
            );
        }

        Ok(UnlockOutcome {
            unlocked: row.is_unlocked,
            newly_unlocked,
            progress: row.progress,
        })
    }

    async fn award_reward(&self, user: UserId, reward: u32, now: DateTime<Utc>) -> EngineResult<()> {
        let mut gamification = match self.gamification_repo.find(user).await? {
            Some(existing) => existing,
            None => UserGamification::new(user, now),
        };
        gamification.add_xp(i64::from(reward), now);
        self.gamification_repo.save(&gamification).await
    }

    /// The active catalog joined with this user's rows. Achievements the
    /// user never touched appear at zero progress; near-completion is
    /// judged here, where the requirement targets are in hand.
    pub async fn overview(&self, user: UserId) -> EngineResult<Vec<AchievementOverviewEntry>> {
        let catalog = self.achievement_repo.list_active().await?;
        let rows: HashMap<AchievementId, UserAchievement> = self
            .user_achievement_repo
            .list_for_user(user)
            .await?
            .into_iter()
            .map(|row| (row.achievement_id, row))
            .collect();

        Ok(catalog
            .into_iter()
            .map(|achievement| {
                let row = rows.get(&achievement.id);
                let near_completion = row
                    .map(|r| r.is_near_completion(achievement.requirement.value))
                    .unwrap_or(false);
                AchievementOverviewEntry {
                    progress: row.map(|r| r.progress).unwrap_or(0),
                    unlocked: row.map(|r| r.is_unlocked).unwrap_or(false),
                    unlocked_at: row.and_then(|r| r.unlocked_at),
                    near_completion,
                    achievement,
                }
            })
            .collect())
    }
}
