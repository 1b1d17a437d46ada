//! crates/readquest_core/src/ports.rs
//!
//! Service contracts (traits) for the engine's core logic. These traits
//! form the boundary of the hexagonal architecture, keeping the core
//! independent of any particular database or transport.

use async_trait::async_trait;

use crate::domain::{
    Achievement, AchievementCode, AchievementId, AchievementRequirement, BookId, ChapterId,
    ReadingListEntry, ReadingProgress, RequirementKind, UserAchievement, UserGamification, UserId,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations. Adapter-specific failures
/// (database, network) are flattened into `Storage` at this boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

//=========================================================================================
// Repository Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ReadingProgressRepository: Send + Sync {
    async fn find(&self, user: UserId, chapter: ChapterId)
        -> EngineResult<Option<ReadingProgress>>;

    async fn find_by_book(&self, user: UserId, book: BookId) -> EngineResult<Vec<ReadingProgress>>;

    /// Upsert on the `(user_id, chapter_id)` natural key. Racing creates
    /// for the same key converge instead of erroring.
    async fn save(&self, progress: &ReadingProgress) -> EngineResult<()>;

    /// Remove every chapter row for the pair. Returns how many went away.
    async fn delete_by_book(&self, user: UserId, book: BookId) -> EngineResult<u64>;
}

#[async_trait]
pub trait ReadingListRepository: Send + Sync {
    async fn find(&self, user: UserId, book: BookId) -> EngineResult<Option<ReadingListEntry>>;

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<ReadingListEntry>>;

    /// Upsert on the `(user_id, book_id)` natural key.
    async fn save(&self, entry: &ReadingListEntry) -> EngineResult<()>;

    /// Returns false when no entry existed; removal is idempotent.
    async fn delete(&self, user: UserId, book: BookId) -> EngineResult<bool>;
}

/// Platform-wide rollup served by the global stats surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct GamificationAggregate {
    pub readers: u64,
    pub total_xp: u64,
    pub longest_streak: u32,
}

#[async_trait]
pub trait GamificationRepository: Send + Sync {
    async fn find(&self, user: UserId) -> EngineResult<Option<UserGamification>>;

    /// Upsert on `user_id`.
    async fn save(&self, gamification: &UserGamification) -> EngineResult<()>;

    async fn aggregate(&self) -> EngineResult<GamificationAggregate>;
}

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn find_by_code(&self, code: &AchievementCode) -> EngineResult<Option<Achievement>>;

    async fn list_active(&self) -> EngineResult<Vec<Achievement>>;

    /// Upsert on `code`. Catalog rows are seeded out of band; the engine
    /// itself never writes them.
    async fn save(&self, achievement: &Achievement) -> EngineResult<()>;
}

#[async_trait]
pub trait UserAchievementRepository: Send + Sync {
    async fn find(
        &self,
        user: UserId,
        achievement: AchievementId,
    ) -> EngineResult<Option<UserAchievement>>;

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<UserAchievement>>;

    /// Upsert on the `(user_id, achievement_id)` natural key.
    async fn save(&self, user_achievement: &UserAchievement) -> EngineResult<()>;

    async fn count_unlocked(&self, user: UserId) -> EngineResult<u64>;

    async fn count_unlocked_all(&self) -> EngineResult<u64>;
}

//=========================================================================================
// Requirement Evaluation Seam
//=========================================================================================

/// Decides whether a requirement is met by the accumulated progress.
/// Synchronous on purpose; evaluation is a pure decision over state the
/// orchestrator already loaded.
pub trait RequirementEvaluator: Send + Sync {
    fn is_satisfied(&self, requirement: &AchievementRequirement, progress: u32) -> bool;
}

/// The built-in evaluator: progress-threshold requirements are met at
/// `progress >= value`; every other kind is left to a bespoke evaluator
/// and never satisfied here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator;

impl RequirementEvaluator for ThresholdEvaluator {
    fn is_satisfied(&self, requirement: &AchievementRequirement, progress: u32) -> bool {
        match requirement.kind {
            RequirementKind::ProgressThreshold => progress >= requirement.value,
            RequirementKind::Custom => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_evaluator_boundary() {
        let req = AchievementRequirement::new(RequirementKind::ProgressThreshold, 5, None).unwrap();
        let eval = ThresholdEvaluator;
        assert!(!eval.is_satisfied(&req, 4));
        assert!(eval.is_satisfied(&req, 5));
        assert!(eval.is_satisfied(&req, 6));
    }

    #[test]
    fn test_threshold_evaluator_never_satisfies_custom_kinds() {
        let req = AchievementRequirement::new(
            RequirementKind::Custom,
            1,
            Some("read_after_midnight".to_string()),
        )
        .unwrap();
        assert!(!ThresholdEvaluator.is_satisfied(&req, u32::MAX));
    }
}
