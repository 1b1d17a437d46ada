pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary
// that will build the web server router.
pub use rest::{
    achievement_progress_handler, book_progress_handler, global_stats_handler,
    list_achievements_handler, list_library_handler, record_progress_handler,
    record_reading_handler, remove_book_handler, update_collections_handler,
    update_status_handler, user_stats_handler,
};
