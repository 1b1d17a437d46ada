//! crates/readquest_core/src/engine/progress.rs
//!
//! Chapter-level progress recording. One write updates two rows: the
//! chapter's progress row and the book's library entry, so the library
//! always knows which chapter the user touched last.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::{
    BookId, ChapterId, ChapterStatus, ReadingListEntry, ReadingProgress, ReadingStatus, UserId,
};
use crate::ports::{EngineResult, ReadingListRepository, ReadingProgressRepository};

/// What the caller gets back after a progress write.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub chapter_progress: u8,
    pub chapter_status: ChapterStatus,
    pub book_status: ReadingStatus,
}

pub struct ProgressTracker {
    progress_repo: Arc<dyn ReadingProgressRepository>,
    reading_list_repo: Arc<dyn ReadingListRepository>,
}

impl ProgressTracker {
    pub fn new(
        progress_repo: Arc<dyn ReadingProgressRepository>,
        reading_list_repo: Arc<dyn ReadingListRepository>,
    ) -> Self {
        Self {
            progress_repo,
            reading_list_repo,
        }
    }

    /// Record a progress reading for one chapter.
    ///
    /// Both rows are created lazily on first contact: the chapter row at
    /// zero, the library entry as Reading. `progress_value` is clamped to
    /// 0..=100 and may move in either direction; elapsed time only ever
    /// accumulates.
    pub async fn record_progress(
        &self,
        user: UserId,
        book: BookId,
        chapter: ChapterId,
        progress_value: i32,
        time_spent_delta: Option<i64>,
    ) -> EngineResult<ProgressUpdate> {
        let now = Utc::now();

        let mut progress = match self.progress_repo.find(user, chapter).await? {
            Some(existing) => existing,
            None => ReadingProgress::new(user, book, chapter, now),
        };
        progress.record(progress_value, time_spent_delta, now);

        let mut entry = match self.reading_list_repo.find(user, book).await? {
            Some(existing) => existing,
            None => ReadingListEntry::new(user, book, now),
        };
        entry.touch_chapter(chapter, now);

        self.progress_repo.save(&progress).await?;
        self.reading_list_repo.save(&entry).await?;

        debug!(
            user = %user,
            chapter = %chapter,
            progress = progress.progress,
            status = progress.status.as_str(),
            "recorded chapter progress"
        );

        Ok(ProgressUpdate {
            chapter_progress: progress.progress,
            chapter_status: progress.status,
            book_status: entry.status,
        })
    }

    /// All chapter rows the user has for one book.
    pub async fn book_progress(
        &self,
        user: UserId,
        book: BookId,
    ) -> EngineResult<Vec<ReadingProgress>> {
        self.progress_repo.find_by_book(user, book).await
    }
}
