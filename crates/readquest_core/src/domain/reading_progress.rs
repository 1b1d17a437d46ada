//! crates/readquest_core/src/domain/reading_progress.rs
//!
//! Per-(user, chapter) completion state. One row exists per pair, created
//! on the first progress report and updated on every one after that.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::ids::{BookId, ChapterId, UserId};
use crate::ports::EngineError;

/// Progress percentage at which a chapter counts as completed.
pub const COMPLETION_THRESHOLD: u8 = 80;

/// Completion state of one chapter. Always derived from the progress
/// percentage, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ChapterStatus {
    /// Status is a pure function of progress: 0 is untouched, anything at
    /// or past [`COMPLETION_THRESHOLD`] counts as done.
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => ChapterStatus::NotStarted,
            p if p >= COMPLETION_THRESHOLD => ChapterStatus::Completed,
            _ => ChapterStatus::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::NotStarted => "not_started",
            ChapterStatus::InProgress => "in_progress",
            ChapterStatus::Completed => "completed",
        }
    }
}

impl FromStr for ChapterStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ChapterStatus::NotStarted),
            "in_progress" => Ok(ChapterStatus::InProgress),
            "completed" => Ok(ChapterStatus::Completed),
            other => Err(EngineError::Validation(format!(
                "unknown chapter status {:?}",
                other
            ))),
        }
    }
}

/// A user's completion state for one chapter of one book.
#[derive(Debug, Clone)]
pub struct ReadingProgress {
    pub user_id: UserId,
    pub chapter_id: ChapterId,
    pub book_id: BookId,
    pub progress: u8,
    pub status: ChapterStatus,
    pub time_spent_seconds: u64,
    pub last_read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingProgress {
    /// Fresh row for the first progress report of a (user, chapter) pair.
    pub fn new(
        user_id: UserId,
        book_id: BookId,
        chapter_id: ChapterId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            chapter_id,
            book_id,
            progress: 0,
            status: ChapterStatus::NotStarted,
            time_spent_seconds: 0,
            last_read_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clamp a raw client-reported percentage into 0..=100. Out-of-range
    /// values are normalized, never rejected.
    pub fn clamp_progress(value: i32) -> u8 {
        value.clamp(0, 100) as u8
    }

    /// Apply one progress report: clamp the percentage, rederive the
    /// status, stamp the read time, and add any reported duration.
    /// Negative durations are ignored; time spent only moves forward.
    pub fn record(
        &mut self,
        progress_value: i32,
        time_spent_delta: Option<i64>,
        now: DateTime<Utc>,
    ) {
        self.progress = Self::clamp_progress(progress_value);
        self.status = ChapterStatus::from_progress(self.progress);
        if let Some(delta) = time_spent_delta {
            if delta > 0 {
                self.time_spent_seconds = self.time_spent_seconds.saturating_add(delta as u64);
            }
        }
        self.last_read_at = Some(now);
        self.updated_at = now;
    }
}
