//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the repository ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use readquest_core::domain::{
    Achievement, AchievementCode, AchievementId, AchievementRequirement, BookId, ChapterId,
    ChapterStatus, CollectionId, ReadingListEntry, ReadingProgress, ReadingStatus, Streak,
    UserAchievement, UserGamification, UserId, Xp,
};
use readquest_core::ports::{
    AchievementRepository, EngineError, EngineResult, GamificationAggregate,
    GamificationRepository, ReadingListRepository, ReadingProgressRepository,
    UserAchievementRepository,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every repository port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ReadingProgressRecord {
    user_id: Uuid,
    book_id: Uuid,
    chapter_id: Uuid,
    progress: i16,
    time_spent_seconds: i64,
    last_read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReadingProgressRecord {
    fn to_domain(self) -> ReadingProgress {
        // The status column is derived, never stored; recompute it from
        // the persisted percentage.
        let progress = self.progress.clamp(0, 100) as u8;
        ReadingProgress {
            user_id: UserId(self.user_id),
            book_id: BookId(self.book_id),
            chapter_id: ChapterId(self.chapter_id),
            progress,
            status: ChapterStatus::from_progress(progress),
            time_spent_seconds: self.time_spent_seconds.max(0) as u64,
            last_read_at: self.last_read_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ReadingListRecord {
    user_id: Uuid,
    book_id: Uuid,
    status: String,
    last_read_chapter_id: Option<Uuid>,
    collection_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReadingListRecord {
    fn to_domain(self) -> EngineResult<ReadingListEntry> {
        let status = self
            .status
            .parse::<ReadingStatus>()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(ReadingListEntry {
            user_id: UserId(self.user_id),
            book_id: BookId(self.book_id),
            status,
            last_read_chapter_id: self.last_read_chapter_id.map(ChapterId),
            collection_ids: self.collection_ids.into_iter().map(CollectionId).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct GamificationRecord {
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    last_read_date: Option<DateTime<Utc>>,
    streak_freeze_count: i32,
    total_xp: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl GamificationRecord {
    fn to_domain(self) -> UserGamification {
        UserGamification {
            user_id: UserId(self.user_id),
            streak: Streak::from_counts(
                self.current_streak.max(0) as u32,
                self.longest_streak.max(0) as u32,
            ),
            last_read_date: self.last_read_date,
            streak_freeze_count: self.streak_freeze_count.max(0) as u32,
            xp: Xp::from_total(self.total_xp.max(0) as u64),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AchievementRecord {
    id: Uuid,
    code: String,
    name: String,
    description: String,
    category: String,
    requirement_kind: String,
    requirement_value: i32,
    requirement_condition: Option<String>,
    xp_reward: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AchievementRecord {
    fn to_domain(self) -> EngineResult<Achievement> {
        let code =
            AchievementCode::new(self.code).map_err(|e| EngineError::Storage(e.to_string()))?;
        let category = self
            .category
            .parse()
            .map_err(|e: EngineError| EngineError::Storage(e.to_string()))?;
        let kind = self
            .requirement_kind
            .parse()
            .map_err(|e: EngineError| EngineError::Storage(e.to_string()))?;
        let requirement = AchievementRequirement::new(
            kind,
            self.requirement_value.max(0) as u32,
            self.requirement_condition,
        )
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(Achievement {
            id: AchievementId(self.id),
            code,
            name: self.name,
            description: self.description,
            category,
            requirement,
            xp_reward: self.xp_reward.max(0) as u32,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserAchievementRecord {
    user_id: Uuid,
    achievement_id: Uuid,
    progress: i32,
    is_unlocked: bool,
    unlocked_at: Option<DateTime<Utc>>,
    reward_xp: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserAchievementRecord {
    fn to_domain(self) -> UserAchievement {
        UserAchievement {
            user_id: UserId(self.user_id),
            achievement_id: AchievementId(self.achievement_id),
            progress: self.progress.max(0) as u32,
            is_unlocked: self.is_unlocked,
            unlocked_at: self.unlocked_at,
            reward_xp: self.reward_xp.map(|xp| xp.max(0) as u32),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AggregateRecord {
    readers: i64,
    total_xp: i64,
    longest_streak: i32,
}

//=========================================================================================
// `ReadingProgressRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReadingProgressRepository for DbAdapter {
    async fn find(
        &self,
        user: UserId,
        chapter: ChapterId,
    ) -> EngineResult<Option<ReadingProgress>> {
        let record = sqlx::query_as::<_, ReadingProgressRecord>(
            "SELECT user_id, book_id, chapter_id, progress, time_spent_seconds, last_read_at, created_at, updated_at \
             FROM reading_progress WHERE user_id = $1 AND chapter_id = $2",
        )
        .bind(user.0)
        .bind(chapter.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn find_by_book(&self, user: UserId, book: BookId) -> EngineResult<Vec<ReadingProgress>> {
        let records = sqlx::query_as::<_, ReadingProgressRecord>(
            "SELECT user_id, book_id, chapter_id, progress, time_spent_seconds, last_read_at, created_at, updated_at \
             FROM reading_progress WHERE user_id = $1 AND book_id = $2 ORDER BY created_at ASC",
        )
        .bind(user.0)
        .bind(book.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save(&self, progress: &ReadingProgress) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO reading_progress \
                 (user_id, book_id, chapter_id, progress, time_spent_seconds, last_read_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id, chapter_id) DO UPDATE SET \
                 book_id = EXCLUDED.book_id, \
                 progress = EXCLUDED.progress, \
                 time_spent_seconds = GREATEST(reading_progress.time_spent_seconds, EXCLUDED.time_spent_seconds), \
                 last_read_at = EXCLUDED.last_read_at, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(progress.user_id.0)
        .bind(progress.book_id.0)
        .bind(progress.chapter_id.0)
        .bind(progress.progress as i16)
        .bind(progress.time_spent_seconds as i64)
        .bind(progress.last_read_at)
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn delete_by_book(&self, user: UserId, book: BookId) -> EngineResult<u64> {
        let result = sqlx::query("DELETE FROM reading_progress WHERE user_id = $1 AND book_id = $2")
            .bind(user.0)
            .bind(book.0)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `ReadingListRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReadingListRepository for DbAdapter {
    async fn find(&self, user: UserId, book: BookId) -> EngineResult<Option<ReadingListEntry>> {
        let record = sqlx::query_as::<_, ReadingListRecord>(
            "SELECT user_id, book_id, status, last_read_chapter_id, collection_ids, created_at, updated_at \
             FROM reading_list WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user.0)
        .bind(book.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        record.map(|r| r.to_domain()).transpose()
    }

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<ReadingListEntry>> {
        let records = sqlx::query_as::<_, ReadingListRecord>(
            "SELECT user_id, book_id, status, last_read_chapter_id, collection_ids, created_at, updated_at \
             FROM reading_list WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save(&self, entry: &ReadingListEntry) -> EngineResult<()> {
        let collection_ids: Vec<Uuid> = entry.collection_ids.iter().map(|c| c.0).collect();
        sqlx::query(
            "INSERT INTO reading_list \
                 (user_id, book_id, status, last_read_chapter_id, collection_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 last_read_chapter_id = EXCLUDED.last_read_chapter_id, \
                 collection_ids = EXCLUDED.collection_ids, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(entry.user_id.0)
        .bind(entry.book_id.0)
        .bind(entry.status.as_str())
        .bind(entry.last_read_chapter_id.map(|c| c.0))
        .bind(collection_ids)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, user: UserId, book: BookId) -> EngineResult<bool> {
        let result = sqlx::query("DELETE FROM reading_list WHERE user_id = $1 AND book_id = $2")
            .bind(user.0)
            .bind(book.0)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

//=========================================================================================
// `GamificationRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl GamificationRepository for DbAdapter {
    async fn find(&self, user: UserId) -> EngineResult<Option<UserGamification>> {
        let record = sqlx::query_as::<_, GamificationRecord>(
            "SELECT user_id, current_streak, longest_streak, last_read_date, streak_freeze_count, total_xp, created_at, updated_at \
             FROM user_gamification WHERE user_id = $1",
        )
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn save(&self, gamification: &UserGamification) -> EngineResult<()> {
        // longest_streak and total_xp only ever grow; GREATEST keeps a
        // stale writer from regressing them.
        sqlx::query(
            "INSERT INTO user_gamification \
                 (user_id, current_streak, longest_streak, last_read_date, streak_freeze_count, total_xp, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 current_streak = EXCLUDED.current_streak, \
                 longest_streak = GREATEST(user_gamification.longest_streak, EXCLUDED.longest_streak), \
                 last_read_date = EXCLUDED.last_read_date, \
                 streak_freeze_count = EXCLUDED.streak_freeze_count, \
                 total_xp = GREATEST(user_gamification.total_xp, EXCLUDED.total_xp), \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(gamification.user_id.0)
        .bind(gamification.streak.current() as i32)
        .bind(gamification.streak.longest() as i32)
        .bind(gamification.last_read_date)
        .bind(gamification.streak_freeze_count as i32)
        .bind(gamification.xp.total() as i64)
        .bind(gamification.created_at)
        .bind(gamification.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn aggregate(&self) -> EngineResult<GamificationAggregate> {
        let record = sqlx::query_as::<_, AggregateRecord>(
            "SELECT COUNT(*) AS readers, \
                    COALESCE(SUM(total_xp), 0)::BIGINT AS total_xp, \
                    COALESCE(MAX(longest_streak), 0) AS longest_streak \
             FROM user_gamification",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(GamificationAggregate {
            readers: record.readers.max(0) as u64,
            total_xp: record.total_xp.max(0) as u64,
            longest_streak: record.longest_streak.max(0) as u32,
        })
    }
}

//=========================================================================================
// `AchievementRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl AchievementRepository for DbAdapter {
    async fn find_by_code(&self, code: &AchievementCode) -> EngineResult<Option<Achievement>> {
        let record = sqlx::query_as::<_, AchievementRecord>(
            "SELECT id, code, name, description, category, requirement_kind, requirement_value, \
                    requirement_condition, xp_reward, is_active, created_at, updated_at \
             FROM achievements WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        record.map(|r| r.to_domain()).transpose()
    }

    async fn list_active(&self) -> EngineResult<Vec<Achievement>> {
        let records = sqlx::query_as::<_, AchievementRecord>(
            "SELECT id, code, name, description, category, requirement_kind, requirement_value, \
                    requirement_condition, xp_reward, is_active, created_at, updated_at \
             FROM achievements WHERE is_active ORDER BY code ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save(&self, achievement: &Achievement) -> EngineResult<()> {
        // The conflict target is the immutable code; the original row id
        // survives so user_achievements references stay intact.
        sqlx::query(
            "INSERT INTO achievements \
                 (id, code, name, description, category, requirement_kind, requirement_value, \
                  requirement_condition, xp_reward, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (code) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 category = EXCLUDED.category, \
                 requirement_kind = EXCLUDED.requirement_kind, \
                 requirement_value = EXCLUDED.requirement_value, \
                 requirement_condition = EXCLUDED.requirement_condition, \
                 xp_reward = EXCLUDED.xp_reward, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(achievement.id.0)
        .bind(achievement.code.as_str())
        .bind(&achievement.name)
        .bind(&achievement.description)
        .bind(achievement.category.as_str())
        .bind(achievement.requirement.kind.as_str())
        .bind(achievement.requirement.value as i32)
        .bind(achievement.requirement.condition.as_deref())
        .bind(achievement.xp_reward as i32)
        .bind(achievement.is_active)
        .bind(achievement.created_at)
        .bind(achievement.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `UserAchievementRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserAchievementRepository for DbAdapter {
    async fn find(
        &self,
        user: UserId,
        achievement: AchievementId,
    ) -> EngineResult<Option<UserAchievement>> {
        let record = sqlx::query_as::<_, UserAchievementRecord>(
            "SELECT user_id, achievement_id, progress, is_unlocked, unlocked_at, reward_xp, created_at, updated_at \
             FROM user_achievements WHERE user_id = $1 AND achievement_id = $2",
        )
        .bind(user.0)
        .bind(achievement.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<UserAchievement>> {
        let records = sqlx::query_as::<_, UserAchievementRecord>(
            "SELECT user_id, achievement_id, progress, is_unlocked, unlocked_at, reward_xp, created_at, updated_at \
             FROM user_achievements WHERE user_id = $1",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save(&self, user_achievement: &UserAchievement) -> EngineResult<()> {
        // An unlock can never be walked back: once is_unlocked is true the
        // OR keeps it, and COALESCE pins the first unlock timestamp and
        // reward snapshot.
        sqlx::query(
            "INSERT INTO user_achievements \
                 (user_id, achievement_id, progress, is_unlocked, unlocked_at, reward_xp, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id, achievement_id) DO UPDATE SET \
                 progress = GREATEST(user_achievements.progress, EXCLUDED.progress), \
                 is_unlocked = user_achievements.is_unlocked OR EXCLUDED.is_unlocked, \
                 unlocked_at = COALESCE(user_achievements.unlocked_at, EXCLUDED.unlocked_at), \
                 reward_xp = COALESCE(user_achievements.reward_xp, EXCLUDED.reward_xp), \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(user_achievement.user_id.0)
        .bind(user_achievement.achievement_id.0)
        .bind(user_achievement.progress as i32)
        .bind(user_achievement.is_unlocked)
        .bind(user_achievement.unlocked_at)
        .bind(user_achievement.reward_xp.map(|xp| xp as i32))
        .bind(user_achievement.created_at)
        .bind(user_achievement.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn count_unlocked(&self, user: UserId) -> EngineResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_achievements WHERE user_id = $1 AND is_unlocked",
        )
        .bind(user.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    async fn count_unlocked_all(&self) -> EngineResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_achievements WHERE is_unlocked")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(count.max(0) as u64)
    }
}
