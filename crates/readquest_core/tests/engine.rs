use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use readquest_core::{
    Achievement, AchievementCategory, AchievementCode, AchievementEngine, AchievementId,
    AchievementRepository, AchievementRequirement, BookId, ChapterId, ChapterStatus, CollectionId,
    EngineError, EngineResult, GamificationAggregate, GamificationRepository, LibraryManager,
    ProgressTracker, ReadingListEntry, ReadingListRepository, ReadingProgress,
    ReadingProgressRepository, ReadingRecorder, ReadingStatus, RequirementKind, StatsReporter,
    StreakOutcome, UserAchievement, UserAchievementRepository, UserGamification, UserId,
    DEFAULT_READING_XP,
};

/// In-memory implementation of every repository port, keyed the way the
/// database keys its tables.
#[derive(Default)]
struct MemStore {
    progress: Mutex<HashMap<(UserId, ChapterId), ReadingProgress>>,
    entries: Mutex<HashMap<(UserId, BookId), ReadingListEntry>>,
    gamification: Mutex<HashMap<UserId, UserGamification>>,
    catalog: Mutex<HashMap<AchievementId, Achievement>>,
    user_achievements: Mutex<HashMap<(UserId, AchievementId), UserAchievement>>,
}

#[async_trait]
impl ReadingProgressRepository for MemStore {
    async fn find(
        &self,
        user: UserId,
        chapter: ChapterId,
    ) -> EngineResult<Option<ReadingProgress>> {
        Ok(self.progress.lock().unwrap().get(&(user, chapter)).cloned())
    }

    async fn find_by_book(&self, user: UserId, book: BookId) -> EngineResult<Vec<ReadingProgress>> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user && p.book_id == book)
            .cloned()
            .collect())
    }

    async fn save(&self, progress: &ReadingProgress) -> EngineResult<()> {
        self.progress
            .lock()
            .unwrap()
            .insert((progress.user_id, progress.chapter_id), progress.clone());
        Ok(())
    }

    async fn delete_by_book(&self, user: UserId, book: BookId) -> EngineResult<u64> {
        let mut map = self.progress.lock().unwrap();
        let before = map.len();
        map.retain(|_, p| !(p.user_id == user && p.book_id == book));
        Ok((before - map.len()) as u64)
    }
}

#[async_trait]
impl ReadingListRepository for MemStore {
    async fn find(&self, user: UserId, book: BookId) -> EngineResult<Option<ReadingListEntry>> {
        Ok(self.entries.lock().unwrap().get(&(user, book)).cloned())
    }

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<ReadingListEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect())
    }

    async fn save(&self, entry: &ReadingListEntry) -> EngineResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert((entry.user_id, entry.book_id), entry.clone());
        Ok(())
    }

    async fn delete(&self, user: UserId, book: BookId) -> EngineResult<bool> {
        Ok(self.entries.lock().unwrap().remove(&(user, book)).is_some())
    }
}

#[async_trait]
impl GamificationRepository for MemStore {
    async fn find(&self, user: UserId) -> EngineResult<Option<UserGamification>> {
        Ok(self.gamification.lock().unwrap().get(&user).cloned())
    }

    async fn save(&self, gamification: &UserGamification) -> EngineResult<()> {
        self.gamification
            .lock()
            .unwrap()
            .insert(gamification.user_id, gamification.clone());
        Ok(())
    }

    async fn aggregate(&self) -> EngineResult<GamificationAggregate> {
        let map = self.gamification.lock().unwrap();
        Ok(GamificationAggregate {
            readers: map.len() as u64,
            total_xp: map.values().map(|g| g.xp.total()).sum(),
            longest_streak: map.values().map(|g| g.streak.longest()).max().unwrap_or(0),
        })
    }
}

#[async_trait]
impl AchievementRepository for MemStore {
    async fn find_by_code(&self, code: &AchievementCode) -> EngineResult<Option<Achievement>> {
        Ok(self
            .catalog
            .lock()
            .unwrap()
            .values()
            .find(|a| a.code == *code)
            .cloned())
    }

    async fn list_active(&self) -> EngineResult<Vec<Achievement>> {
        let mut active: Vec<Achievement> = self
            .catalog
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(active)
    }

    async fn save(&self, achievement: &Achievement) -> EngineResult<()> {
        self.catalog
            .lock()
            .unwrap()
            .insert(achievement.id, achievement.clone());
        Ok(())
    }
}

#[async_trait]
impl UserAchievementRepository for MemStore {
    async fn find(
        &self,
        user: UserId,
        achievement: AchievementId,
    ) -> EngineResult<Option<UserAchievement>> {
        Ok(self
            .user_achievements
            .lock()
            .unwrap()
            .get(&(user, achievement))
            .cloned())
    }

    async fn list_for_user(&self, user: UserId) -> EngineResult<Vec<UserAchievement>> {
        Ok(self
            .user_achievements
            .lock()
            .unwrap()
            .values()
            .filter(|ua| ua.user_id == user)
            .cloned()
            .collect())
    }

    async fn save(&self, user_achievement: &UserAchievement) -> EngineResult<()> {
        self.user_achievements.lock().unwrap().insert(
            (user_achievement.user_id, user_achievement.achievement_id),
            user_achievement.clone(),
        );
        Ok(())
    }

    async fn count_unlocked(&self, user: UserId) -> EngineResult<u64> {
        Ok(self
            .user_achievements
            .lock()
            .unwrap()
            .values()
            .filter(|ua| ua.user_id == user && ua.is_unlocked)
            .count() as u64)
    }

    async fn count_unlocked_all(&self) -> EngineResult<u64> {
        Ok(self
            .user_achievements
            .lock()
            .unwrap()
            .values()
            .filter(|ua| ua.is_unlocked)
            .count() as u64)
    }
}

fn store() -> Arc<MemStore> {
    Arc::new(MemStore::default())
}

fn tracker(store: &Arc<MemStore>) -> ProgressTracker {
    ProgressTracker::new(store.clone(), store.clone())
}

fn library(store: &Arc<MemStore>) -> LibraryManager {
    LibraryManager::new(store.clone(), store.clone())
}

fn recorder(store: &Arc<MemStore>) -> ReadingRecorder {
    ReadingRecorder::new(store.clone())
}

fn achievement_engine(store: &Arc<MemStore>) -> AchievementEngine {
    AchievementEngine::new(store.clone(), store.clone(), store.clone())
}

fn reporter(store: &Arc<MemStore>) -> StatsReporter {
    StatsReporter::new(store.clone(), store.clone())
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

async fn seed_achievement(
    store: &Arc<MemStore>,
    code: &str,
    target: u32,
    xp_reward: u32,
    is_active: bool,
) -> Achievement {
    let now = at(1, 0);
    let achievement = Achievement {
        id: AchievementId::new(),
        code: AchievementCode::new(code).unwrap(),
        name: code.replace('_', " "),
        description: format!("test achievement {code}"),
        category: AchievementCategory::Reading,
        requirement: AchievementRequirement::new(RequirementKind::ProgressThreshold, target, None)
            .unwrap(),
        xp_reward,
        is_active,
        created_at: now,
        updated_at: now,
    };
    AchievementRepository::save(store.as_ref(), &achievement)
        .await
        .unwrap();
    achievement
}

//=========================================================================================
// Progress tracking
//=========================================================================================

#[tokio::test]
async fn test_record_progress_creates_both_rows() {
    let store = store();
    let tracker = tracker(&store);
    let (user, book, chapter) = (UserId::new(), BookId::new(), ChapterId::new());

    let update = tracker
        .record_progress(user, book, chapter, 85, Some(300))
        .await
        .unwrap();

    assert_eq!(update.chapter_progress, 85);
    assert_eq!(update.chapter_status, ChapterStatus::Completed);
    assert_eq!(update.book_status, ReadingStatus::Reading);

    let entry = ReadingListRepository::find(store.as_ref(), user, book)
        .await
        .unwrap()
        .expect("library entry should have been created");
    assert_eq!(entry.last_read_chapter_id, Some(chapter));

    let row = ReadingProgressRepository::find(store.as_ref(), user, chapter)
        .await
        .unwrap()
        .expect("progress row should have been created");
    assert_eq!(row.time_spent_seconds, 300);
    assert!(row.last_read_at.is_some());
}

#[tokio::test]
async fn test_record_progress_clamps_out_of_range_values() {
    let store = store();
    let tracker = tracker(&store);
    let (user, book, chapter) = (UserId::new(), BookId::new(), ChapterId::new());

    let update = tracker
        .record_progress(user, book, chapter, 150, None)
        .await
        .unwrap();
    assert_eq!(update.chapter_progress, 100);
    assert_eq!(update.chapter_status, ChapterStatus::Completed);

    let update = tracker
        .record_progress(user, book, chapter, -20, None)
        .await
        .unwrap();
    assert_eq!(update.chapter_progress, 0);
    assert_eq!(update.chapter_status, ChapterStatus::NotStarted);
}

#[tokio::test]
async fn test_time_spent_accumulates_and_survives_progress_regression() {
    let store = store();
    let tracker = tracker(&store);
    let (user, book, chapter) = (UserId::new(), BookId::new(), ChapterId::new());

    tracker
        .record_progress(user, book, chapter, 50, Some(300))
        .await
        .unwrap();
    // Re-reading an earlier passage moves progress down but keeps time.
    tracker
        .record_progress(user, book, chapter, 30, Some(300))
        .await
        .unwrap();
    // A negative delta is dropped.
    tracker
        .record_progress(user, book, chapter, 30, Some(-1_000))
        .await
        .unwrap();

    let row = ReadingProgressRepository::find(store.as_ref(), user, chapter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.progress, 30);
    assert_eq!(row.time_spent_seconds, 600);
}

#[tokio::test]
async fn test_same_chapter_updates_do_not_duplicate_rows() {
    let store = store();
    let tracker = tracker(&store);
    let (user, book) = (UserId::new(), BookId::new());
    let (first, second) = (ChapterId::new(), ChapterId::new());

    tracker
        .record_progress(user, book, first, 40, None)
        .await
        .unwrap();
    tracker
        .record_progress(user, book, first, 90, None)
        .await
        .unwrap();
    tracker
        .record_progress(user, book, second, 10, None)
        .await
        .unwrap();

    let rows = tracker.book_progress(user, book).await.unwrap();
    assert_eq!(rows.len(), 2);
}

//=========================================================================================
// Library management
//=========================================================================================

#[tokio::test]
async fn test_update_status_lazily_creates_entry() {
    let store = store();
    let library = library(&store);
    let (user, book) = (UserId::new(), BookId::new());

    let entry = library
        .update_status(user, book, ReadingStatus::Completed)
        .await
        .unwrap();
    assert_eq!(entry.status, ReadingStatus::Completed);

    let listed = library.list(user).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_update_collections_replaces_membership() {
    let store = store();
    let library = library(&store);
    let (user, book) = (UserId::new(), BookId::new());
    let (favorites, later) = (CollectionId::new(), CollectionId::new());

    let entry = library
        .update_collections(user, book, vec![favorites, later, favorites])
        .await
        .unwrap();
    assert_eq!(entry.collection_ids, vec![favorites, later]);
    assert_eq!(entry.status, ReadingStatus::Reading);

    let entry = library
        .update_collections(user, book, vec![later])
        .await
        .unwrap();
    assert_eq!(entry.collection_ids, vec![later]);
}

#[tokio::test]
async fn test_remove_from_library_cascades_and_is_idempotent() {
    let store = store();
    let tracker = tracker(&store);
    let library = library(&store);
    let (user, book) = (UserId::new(), BookId::new());

    tracker
        .record_progress(user, book, ChapterId::new(), 40, Some(60))
        .await
        .unwrap();
    tracker
        .record_progress(user, book, ChapterId::new(), 90, Some(60))
        .await
        .unwrap();

    assert!(library.remove_from_library(user, book).await.unwrap());
    assert!(tracker.book_progress(user, book).await.unwrap().is_empty());
    assert!(library.list(user).await.unwrap().is_empty());

    // Removing again reports nothing removed but still succeeds.
    assert!(!library.remove_from_library(user, book).await.unwrap());
}

#[tokio::test]
async fn test_remove_does_not_touch_other_books() {
    let store = store();
    let tracker = tracker(&store);
    let library = library(&store);
    let user = UserId::new();
    let (kept, removed) = (BookId::new(), BookId::new());

    tracker
        .record_progress(user, kept, ChapterId::new(), 50, None)
        .await
        .unwrap();
    tracker
        .record_progress(user, removed, ChapterId::new(), 50, None)
        .await
        .unwrap();

    library.remove_from_library(user, removed).await.unwrap();

    assert_eq!(tracker.book_progress(user, kept).await.unwrap().len(), 1);
    assert_eq!(library.list(user).await.unwrap().len(), 1);
}

//=========================================================================================
// Reading events, streaks and XP
//=========================================================================================

#[tokio::test]
async fn test_reading_walk_extends_freezes_and_resets() {
    let store = store();
    let recorder = recorder(&store);
    let user = UserId::new();

    let snap = recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(1, 20))
        .await
        .unwrap();
    assert_eq!(snap.outcome, StreakOutcome::Started);
    assert_eq!(snap.current_streak, 1);
    assert_eq!(snap.streak_freezes, 2);

    let snap = recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(2, 7))
        .await
        .unwrap();
    assert_eq!(snap.outcome, StreakOutcome::Extended);
    assert_eq!(snap.current_streak, 2);

    // March 3rd is skipped; a freeze keeps the streak alive.
    let snap = recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(4, 22))
        .await
        .unwrap();
    assert_eq!(snap.outcome, StreakOutcome::Frozen);
    assert_eq!(snap.current_streak, 2);
    assert_eq!(snap.streak_freezes, 1);

    // Four days of silence cannot be frozen away.
    let snap = recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(8, 9))
        .await
        .unwrap();
    assert_eq!(snap.outcome, StreakOutcome::Reset);
    assert_eq!(snap.current_streak, 1);
    assert_eq!(snap.longest_streak, 2);
    assert_eq!(snap.streak_freezes, 1);
    assert_eq!(snap.total_xp, 40);
}

#[tokio::test]
async fn test_same_day_readings_accrue_xp_without_moving_streak() {
    let store = store();
    let recorder = recorder(&store);
    let user = UserId::new();

    recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(1, 8))
        .await
        .unwrap();
    let mut snap = None;
    for hour in 9..=17 {
        snap = Some(
            recorder
                .record_reading_on(user, DEFAULT_READING_XP, at(1, hour))
                .await
                .unwrap(),
        );
    }
    let snap = snap.unwrap();

    assert_eq!(snap.outcome, StreakOutcome::SameDay);
    assert_eq!(snap.current_streak, 1);
    assert_eq!(snap.total_xp, 100);
    assert_eq!(snap.level, 2);
}

//=========================================================================================
// Achievements
//=========================================================================================

#[tokio::test]
async fn test_unlock_at_threshold_with_idempotent_repeat() {
    let store = store();
    let engine = achievement_engine(&store);
    let user = UserId::new();
    let achievement = seed_achievement(&store, "first_book", 5, 50, true).await;
    let code = achievement.code.clone();

    let outcome = engine.apply_progress(user, &code, 4).await.unwrap();
    assert!(!outcome.unlocked);
    assert_eq!(outcome.progress, 4);

    let outcome = engine.apply_progress(user, &code, 1).await.unwrap();
    assert!(outcome.unlocked);
    assert!(outcome.newly_unlocked);
    assert_eq!(outcome.progress, 5);

    let row = UserAchievementRepository::find(store.as_ref(), user, achievement.id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.unlocked_at.is_some());
    assert_eq!(row.reward_xp, Some(50));

    // The reward lands on the gamification state exactly once.
    let gamification = GamificationRepository::find(store.as_ref(), user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gamification.xp.total(), 50);

    let outcome = engine.apply_progress(user, &code, 3).await.unwrap();
    assert!(outcome.unlocked);
    assert!(!outcome.newly_unlocked);
    assert_eq!(outcome.progress, 5);

    let gamification = GamificationRepository::find(store.as_ref(), user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gamification.xp.total(), 50);
}

#[tokio::test]
async fn test_unknown_achievement_code_is_not_found() {
    let store = store();
    let engine = achievement_engine(&store);
    let code = AchievementCode::new("never_seeded").unwrap();

    let err = engine
        .apply_progress(UserId::new(), &code, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn test_inactive_achievement_accepts_no_progress() {
    let store = store();
    let engine = achievement_engine(&store);
    let user = UserId::new();
    let achievement = seed_achievement(&store, "retired_badge", 3, 25, false).await;

    let outcome = engine
        .apply_progress(user, &achievement.code, 3)
        .await
        .unwrap();
    assert!(!outcome.unlocked);
    assert_eq!(outcome.progress, 0);

    // No per-user row materializes for a disabled achievement.
    let row = UserAchievementRepository::find(store.as_ref(), user, achievement.id)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn test_negative_delta_is_dropped() {
    let store = store();
    let engine = achievement_engine(&store);
    let user = UserId::new();
    let achievement = seed_achievement(&store, "bookworm_10", 10, 100, true).await;

    engine
        .apply_progress(user, &achievement.code, 4)
        .await
        .unwrap();
    let outcome = engine
        .apply_progress(user, &achievement.code, -7)
        .await
        .unwrap();
    assert_eq!(outcome.progress, 4);
    assert!(!outcome.unlocked);
}

#[tokio::test]
async fn test_overview_joins_catalog_with_user_state() {
    let store = store();
    let engine = achievement_engine(&store);
    let user = UserId::new();
    let near = seed_achievement(&store, "chapter_century", 100, 250, true).await;
    let untouched = seed_achievement(&store, "streak_30", 30, 300, true).await;
    seed_achievement(&store, "hidden_badge", 5, 10, false).await;

    engine.apply_progress(user, &near.code, 80).await.unwrap();

    let overview = engine.overview(user).await.unwrap();
    assert_eq!(overview.len(), 2, "inactive rows stay out of the overview");

    let near_entry = overview
        .iter()
        .find(|e| e.achievement.id == near.id)
        .unwrap();
    assert_eq!(near_entry.progress, 80);
    assert!(near_entry.near_completion);
    assert!(!near_entry.unlocked);

    let untouched_entry = overview
        .iter()
        .find(|e| e.achievement.id == untouched.id)
        .unwrap();
    assert_eq!(untouched_entry.progress, 0);
    assert!(!untouched_entry.near_completion);
}

//=========================================================================================
// Stats
//=========================================================================================

#[tokio::test]
async fn test_user_stats_for_fresh_user_returns_defaults() {
    let store = store();
    let reporter = reporter(&store);
    let user = UserId::new();

    let stats = reporter.user_stats(user).await.unwrap();
    assert_eq!(stats.level, 1);
    assert_eq!(stats.total_xp, 0);
    assert_eq!(stats.xp_for_next_level, 100);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.streak_freezes, 2);
    assert_eq!(stats.achievements_unlocked, 0);

    // Reading a default snapshot must not create a row.
    assert!(GamificationRepository::find(store.as_ref(), user)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_user_stats_counts_unlocked_and_in_progress() {
    let store = store();
    let engine = achievement_engine(&store);
    let recorder = recorder(&store);
    let reporter = reporter(&store);
    let user = UserId::new();

    let done = seed_achievement(&store, "first_book", 1, 50, true).await;
    let partial = seed_achievement(&store, "bookworm_10", 10, 100, true).await;

    recorder
        .record_reading_on(user, DEFAULT_READING_XP, at(1, 9))
        .await
        .unwrap();
    engine.apply_progress(user, &done.code, 1).await.unwrap();
    engine.apply_progress(user, &partial.code, 3).await.unwrap();

    let stats = reporter.user_stats(user).await.unwrap();
    assert_eq!(stats.achievements_unlocked, 1);
    assert_eq!(stats.achievements_in_progress, 1);
    assert_eq!(stats.current_streak, 1);
    // 10 from the reading plus the 50 reward.
    assert_eq!(stats.total_xp, 60);
    assert_eq!(stats.xp_for_next_level, 40);
}

#[tokio::test]
async fn test_global_stats_aggregate_across_users() {
    let store = store();
    let recorder = recorder(&store);
    let engine = achievement_engine(&store);
    let reporter = reporter(&store);
    let (alice, bob) = (UserId::new(), UserId::new());
    let achievement = seed_achievement(&store, "first_book", 1, 50, true).await;

    for day in 1..=3 {
        recorder
            .record_reading_on(alice, DEFAULT_READING_XP, at(day, 8))
            .await
            .unwrap();
    }
    recorder
        .record_reading_on(bob, DEFAULT_READING_XP, at(1, 8))
        .await
        .unwrap();
    engine
        .apply_progress(bob, &achievement.code, 1)
        .await
        .unwrap();

    let stats = reporter.global_stats().await.unwrap();
    assert_eq!(stats.readers, 2);
    assert_eq!(stats.longest_streak, 3);
    // Alice 30, Bob 10 + 50 reward.
    assert_eq!(stats.total_xp, 90);
    assert_eq!(stats.achievements_unlocked, 1);
}
