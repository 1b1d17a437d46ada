pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::{
    Achievement, AchievementCategory, AchievementCode, AchievementId, AchievementRequirement,
    BookId, ChapterId, ChapterStatus, CollectionId, ReadingListEntry, ReadingProgress,
    ReadingStatus, RequirementKind, Streak, StreakOutcome, UserAchievement, UserGamification,
    UserId, Xp, COMPLETION_THRESHOLD, DEFAULT_STREAK_FREEZES,
};
pub use engine::{
    AchievementEngine, AchievementOverviewEntry, GlobalStats, LibraryManager, ProgressTracker,
    ProgressUpdate, ReadingRecorder, ReadingSnapshot, StatsReporter, UnlockOutcome, UserStats,
    DEFAULT_READING_XP,
};
pub use ports::{
    AchievementRepository, EngineError, EngineResult, GamificationAggregate,
    GamificationRepository, ReadingListRepository, ReadingProgressRepository,
    RequirementEvaluator, ThresholdEvaluator, UserAchievementRepository,
};
