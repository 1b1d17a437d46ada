//! crates/readquest_core/src/domain/achievement.rs
//!
//! Achievement catalog entries and per-user unlock state. Catalog rows are
//! seeded out of band; the engine only reads them and mutates the per-user
//! rows.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::ids::{AchievementCode, AchievementId, UserId};
use crate::ports::EngineError;

/// Percentage of the requirement target at which an in-progress
/// achievement counts as nearly complete.
const NEAR_COMPLETION_PERCENT: u64 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCategory {
    Reading,
    Streak,
    Social,
    Special,
    Onboarding,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::Reading => "reading",
            AchievementCategory::Streak => "streak",
            AchievementCategory::Social => "social",
            AchievementCategory::Special => "special",
            AchievementCategory::Onboarding => "onboarding",
        }
    }
}

impl FromStr for AchievementCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(AchievementCategory::Reading),
            "streak" => Ok(AchievementCategory::Streak),
            "social" => Ok(AchievementCategory::Social),
            "special" => Ok(AchievementCategory::Special),
            "onboarding" => Ok(AchievementCategory::Onboarding),
            other => Err(EngineError::Validation(format!(
                "unknown achievement category: {other}"
            ))),
        }
    }
}

/// How an achievement's requirement is checked. The engine evaluates
/// `ProgressThreshold` itself; every other kind goes through whatever
/// evaluator the caller plugged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    ProgressThreshold,
    Custom,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::ProgressThreshold => "progress_threshold",
            RequirementKind::Custom => "custom",
        }
    }
}

impl FromStr for RequirementKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "progress_threshold" => Ok(RequirementKind::ProgressThreshold),
            "custom" => Ok(RequirementKind::Custom),
            other => Err(EngineError::Validation(format!(
                "unknown requirement kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementRequirement {
    pub kind: RequirementKind,
    pub value: u32,
    /// Opaque payload for `Custom` evaluators; unused by the built-in
    /// threshold check.
    pub condition: Option<String>,
}

impl AchievementRequirement {
    pub fn new(
        kind: RequirementKind,
        value: u32,
        condition: Option<String>,
    ) -> Result<Self, EngineError> {
        if value == 0 {
            return Err(EngineError::Validation(
                "requirement value must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            kind,
            value,
            condition,
        })
    }
}

/// A catalog entry. `code` is the stable public handle and never changes
/// after creation; `id` exists for foreign keys.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: AchievementId,
    pub code: AchievementCode,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub requirement: AchievementRequirement,
    pub xp_reward: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's progress toward one achievement, keyed by
/// `(user_id, achievement_id)`.
#[derive(Debug, Clone)]
pub struct UserAchievement {
    pub user_id: UserId,
    pub achievement_id: AchievementId,
    pub progress: u32,
    pub is_unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Reward snapshotted at unlock time so later catalog edits never
    /// change what a user already earned.
    pub reward_xp: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAchievement {
    pub fn new(user_id: UserId, achievement_id: AchievementId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            achievement_id,
            progress: 0,
            is_unlocked: false,
            unlocked_at: None,
            reward_xp: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Raise the progress counter. Never unlocks on its own; the
    /// orchestrating use-case decides that separately.
    pub fn increment_progress(&mut self, delta: u32, now: DateTime<Utc>) {
        self.progress = self.progress.saturating_add(delta);
        self.updated_at = now;
    }

    pub fn set_progress(&mut self, value: u32, now: DateTime<Utc>) {
        self.progress = value;
        self.updated_at = now;
    }

    /// Flip to unlocked. Returns true only on the first call; the unlock
    /// timestamp and reward snapshot are written exactly once.
    pub fn unlock(&mut self, reward: u32, now: DateTime<Utc>) -> bool {
        if self.is_unlocked {
            return false;
        }
        self.is_unlocked = true;
        self.unlocked_at = Some(now);
        self.reward_xp = Some(reward);
        self.updated_at = now;
        true
    }

    /// Still locked but within reach of the target.
    pub fn is_near_completion(&self, target: u32) -> bool {
        !self.is_unlocked
            && u64::from(self.progress) * 100 >= u64::from(target) * NEAR_COMPLETION_PERCENT
    }
}
