//! crates/readquest_core/src/engine/library.rs
//!
//! Reading-list management: status changes, collection membership, and
//! removal with its progress cascade.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::{BookId, CollectionId, ReadingListEntry, ReadingStatus, UserId};
use crate::ports::{EngineResult, ReadingListRepository, ReadingProgressRepository};

pub struct LibraryManager {
    reading_list_repo: Arc<dyn ReadingListRepository>,
    progress_repo: Arc<dyn ReadingProgressRepository>,
}

impl LibraryManager {
    pub fn new(
        reading_list_repo: Arc<dyn ReadingListRepository>,
        progress_repo: Arc<dyn ReadingProgressRepository>,
    ) -> Self {
        Self {
            reading_list_repo,
            progress_repo,
        }
    }

    /// Set the book's reading status, creating the entry if the book was
    /// never in the library. Completion is always this explicit call;
    /// chapter progress never infers it.
    pub async fn update_status(
        &self,
        user: UserId,
        book: BookId,
        status: ReadingStatus,
    ) -> EngineResult<ReadingListEntry> {
        let now = Utc::now();
        let mut entry = match self.reading_list_repo.find(user, book).await? {
            Some(existing) => existing,
            None => ReadingListEntry::new(user, book, now),
        };
        entry.set_status(status, now);
        self.reading_list_repo.save(&entry).await?;

        debug!(user = %user, book = %book, status = status.as_str(), "updated reading status");
        Ok(entry)
    }

    /// Replace the book's collection membership. Duplicates in the input
    /// collapse; the stored order is first occurrence.
    pub async fn update_collections(
        &self,
        user: UserId,
        book: BookId,
        collections: Vec<CollectionId>,
    ) -> EngineResult<ReadingListEntry> {
        let now = Utc::now();
        let mut entry = match self.reading_list_repo.find(user, book).await? {
            Some(existing) => existing,
            None => ReadingListEntry::new(user, book, now),
        };
        entry.set_collections(collections, now);
        self.reading_list_repo.save(&entry).await?;
        Ok(entry)
    }

    pub async fn list(&self, user: UserId) -> EngineResult<Vec<ReadingListEntry>> {
        self.reading_list_repo.list_for_user(user).await
    }

    /// Drop the book from the library along with every chapter progress
    /// row for it. Returns whether an entry actually existed; removing an
    /// absent book is a successful no-op.
    pub async fn remove_from_library(&self, user: UserId, book: BookId) -> EngineResult<bool> {
        let chapters_removed = self.progress_repo.delete_by_book(user, book).await?;
        let removed = self.reading_list_repo.delete(user, book).await?;

        debug!(
            user = %user,
            book = %book,
            chapters_removed,
            removed,
            "removed book from library"
        );
        Ok(removed)
    }
}
