//! crates/readquest_core/src/domain/mod.rs
//!
//! Domain model: identifier newtypes, value types, and the entities the
//! engine use-cases orchestrate. Everything here is synchronous and free
//! of I/O; persistence lives behind the ports.

pub mod achievement;
pub mod gamification;
pub mod ids;
pub mod reading_list;
pub mod reading_progress;
pub mod streak;
pub mod xp;

pub use achievement::{
    Achievement, AchievementCategory, AchievementRequirement, RequirementKind, UserAchievement,
};
pub use gamification::{day_diff, StreakOutcome, UserGamification, DEFAULT_STREAK_FREEZES};
pub use ids::{AchievementCode, AchievementId, BookId, ChapterId, CollectionId, UserId};
pub use reading_list::{ReadingListEntry, ReadingStatus};
pub use reading_progress::{ChapterStatus, ReadingProgress, COMPLETION_THRESHOLD};
pub use streak::Streak;
pub use xp::Xp;
