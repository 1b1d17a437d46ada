//! crates/readquest_core/src/domain/reading_list.rs
//!
//! The record of a user's relationship to a book: reading status, the last
//! chapter they touched, and which collections the book is filed under.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::ids::{BookId, ChapterId, CollectionId, UserId};
use crate::ports::EngineError;

/// Book-level reading status. Entries created lazily by a reading event
/// start as `Reading`; moving to `Completed` is always an explicit caller
/// decision, never inferred from chapter progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Completed,
    Dropped,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
            ReadingStatus::Dropped => "dropped",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(ReadingStatus::WantToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "completed" => Ok(ReadingStatus::Completed),
            "dropped" => Ok(ReadingStatus::Dropped),
            other => Err(EngineError::Validation(format!(
                "unknown reading status {:?}",
                other
            ))),
        }
    }
}

/// One (user, book) library entry.
#[derive(Debug, Clone)]
pub struct ReadingListEntry {
    pub user_id: UserId,
    pub book_id: BookId,
    pub status: ReadingStatus,
    pub last_read_chapter_id: Option<ChapterId>,
    pub collection_ids: Vec<CollectionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingListEntry {
    /// Lazily created entries default to `Reading`.
    pub fn new(user_id: UserId, book_id: BookId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            book_id,
            status: ReadingStatus::Reading,
            last_read_chapter_id: None,
            collection_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Point the entry at the chapter the user just read.
    pub fn touch_chapter(&mut self, chapter_id: ChapterId, now: DateTime<Utc>) {
        self.last_read_chapter_id = Some(chapter_id);
        self.updated_at = now;
    }

    pub fn set_status(&mut self, status: ReadingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Replace the collection memberships. Duplicates are dropped while
    /// first-seen order is kept, so reapplying the same set is a no-op.
    pub fn set_collections(&mut self, collections: Vec<CollectionId>, now: DateTime<Utc>) {
        let mut seen = HashSet::new();
        self.collection_ids = collections
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        self.updated_at = now;
    }
}
