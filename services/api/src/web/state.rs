//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use readquest_core::engine::{
    AchievementEngine, LibraryManager, ProgressTracker, ReadingRecorder, StatsReporter,
};

use crate::adapters::DbAdapter;
use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers. Every use-case runs against the same database adapter.
pub struct AppState {
    pub tracker: ProgressTracker,
    pub library: LibraryManager,
    pub recorder: ReadingRecorder,
    pub achievements: AchievementEngine,
    pub stats: StatsReporter,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the engine use-cases to the database adapter.
    pub fn new(db: Arc<DbAdapter>, config: Arc<Config>) -> Self {
        Self {
            tracker: ProgressTracker::new(db.clone(), db.clone()),
            library: LibraryManager::new(db.clone(), db.clone()),
            recorder: ReadingRecorder::new(db.clone()),
            achievements: AchievementEngine::new(db.clone(), db.clone(), db.clone()),
            stats: StatsReporter::new(db.clone(), db),
            config,
        }
    }
}
