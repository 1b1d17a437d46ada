//! crates/readquest_core/src/engine/mod.rs
//!
//! Use-cases orchestrating the domain through the repository ports. Each
//! struct owns `Arc<dyn Trait>` repository handles and nothing else; entities
//! never reference each other directly.

pub mod achievements;
pub mod library;
pub mod progress;
pub mod reading;
pub mod stats;

pub use achievements::{AchievementEngine, AchievementOverviewEntry, UnlockOutcome};
pub use library::LibraryManager;
pub use progress::{ProgressTracker, ProgressUpdate};
pub use reading::{ReadingRecorder, ReadingSnapshot, DEFAULT_READING_XP};
pub use stats::{GlobalStats, StatsReporter, UserStats};
