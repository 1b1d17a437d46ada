//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use readquest_core::domain::{AchievementCode, ReadingListEntry, ReadingStatus, UserId};
use readquest_core::engine::{AchievementOverviewEntry, ReadingSnapshot, DEFAULT_READING_XP};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::engine_error_response;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        record_progress_handler,
        book_progress_handler,
        record_reading_handler,
        user_stats_handler,
        global_stats_handler,
        list_achievements_handler,
        achievement_progress_handler,
        list_library_handler,
        update_status_handler,
        update_collections_handler,
        remove_book_handler,
    ),
    components(
        schemas(
            RecordProgressRequest,
            RecordProgressResponse,
            ChapterProgressResponse,
            RecordReadingRequest,
            ReadingSnapshotResponse,
            UserStatsResponse,
            GlobalStatsResponse,
            AchievementEntryResponse,
            AchievementProgressRequest,
            UnlockResponse,
            LibraryEntryResponse,
            UpdateStatusRequest,
            UpdateCollectionsRequest,
            RemoveResponse,
        )
    ),
    tags(
        (name = "ReadQuest API", description = "API endpoints for reading progress, streaks, XP and achievements.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload and Response Structs
//=========================================================================================

/// Payload for recording progress within one chapter.
#[derive(Deserialize, ToSchema)]
pub struct RecordProgressRequest {
    pub book_id: Uuid,
    pub chapter_id: Uuid,
    /// Percentage read, clamped server-side to 0..=100.
    pub progress: i32,
    /// Seconds spent reading since the previous report.
    pub time_spent_delta: Option<i64>,
}

/// The state of the chapter and book after a progress write.
#[derive(Serialize, ToSchema)]
pub struct RecordProgressResponse {
    pub chapter_progress: u8,
    pub chapter_status: String,
    pub book_status: String,
}

/// One persisted chapter progress row.
#[derive(Serialize, ToSchema)]
pub struct ChapterProgressResponse {
    pub chapter_id: Uuid,
    pub progress: u8,
    pub status: String,
    pub time_spent_seconds: u64,
    pub last_read_at: Option<DateTime<Utc>>,
}

fn default_reading_xp() -> i64 {
    DEFAULT_READING_XP
}

/// Payload for a qualifying daily reading event.
#[derive(Deserialize, ToSchema)]
pub struct RecordReadingRequest {
    /// XP granted for this event; defaults to the standard amount.
    #[serde(default = "default_reading_xp")]
    pub xp_amount: i64,
}

/// Streak and XP state after a reading event.
#[derive(Serialize, ToSchema)]
pub struct ReadingSnapshotResponse {
    pub outcome: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_read_date: Option<DateTime<Utc>>,
    pub total_xp: u64,
    pub level: u32,
}

impl From<ReadingSnapshot> for ReadingSnapshotResponse {
    fn from(snapshot: ReadingSnapshot) -> Self {
        Self {
            outcome: snapshot.outcome.as_str().to_string(),
            current_streak: snapshot.current_streak,
            longest_streak: snapshot.longest_streak,
            streak_freezes: snapshot.streak_freezes,
            last_read_date: snapshot.last_read_date,
            total_xp: snapshot.total_xp,
            level: snapshot.level,
        }
    }
}

/// Per-user gamification dashboard numbers.
#[derive(Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub level: u32,
    pub total_xp: u64,
    pub xp_for_next_level: u64,
    pub progress_to_next_level: u8,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_read_date: Option<DateTime<Utc>>,
    pub achievements_unlocked: u64,
    pub achievements_in_progress: u64,
}

/// Platform-wide rollup.
#[derive(Serialize, ToSchema)]
pub struct GlobalStatsResponse {
    pub readers: u64,
    pub total_xp: u64,
    pub longest_streak: u32,
    pub achievements_unlocked: u64,
}

/// One catalog achievement joined with the caller's progress.
#[derive(Serialize, ToSchema)]
pub struct AchievementEntryResponse {
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub requirement_value: u32,
    pub xp_reward: u32,
    pub progress: u32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub near_completion: bool,
}

impl From<AchievementOverviewEntry> for AchievementEntryResponse {
    fn from(entry: AchievementOverviewEntry) -> Self {
        Self {
            code: entry.achievement.code.as_str().to_string(),
            name: entry.achievement.name,
            description: entry.achievement.description,
            category: entry.achievement.category.as_str().to_string(),
            requirement_value: entry.achievement.requirement.value,
            xp_reward: entry.achievement.xp_reward,
            progress: entry.progress,
            unlocked: entry.unlocked,
            unlocked_at: entry.unlocked_at,
            near_completion: entry.near_completion,
        }
    }
}

fn default_progress_delta() -> i64 {
    1
}

/// Payload for advancing progress toward an achievement.
#[derive(Deserialize, ToSchema)]
pub struct AchievementProgressRequest {
    /// How much progress to add; defaults to one step.
    #[serde(default = "default_progress_delta")]
    pub progress_delta: i64,
}

/// Result of an achievement progress application.
#[derive(Serialize, ToSchema)]
pub struct UnlockResponse {
    pub unlocked: bool,
    pub newly_unlocked: bool,
    pub progress: u32,
}

/// One reading-list entry.
#[derive(Serialize, ToSchema)]
pub struct LibraryEntryResponse {
    pub book_id: Uuid,
    pub status: String,
    pub last_read_chapter_id: Option<Uuid>,
    pub collection_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReadingListEntry> for LibraryEntryResponse {
    fn from(entry: ReadingListEntry) -> Self {
        Self {
            book_id: entry.book_id.0,
            status: entry.status.as_str().to_string(),
            last_read_chapter_id: entry.last_read_chapter_id.map(|c| c.0),
            collection_ids: entry.collection_ids.into_iter().map(|c| c.0).collect(),
            updated_at: entry.updated_at,
        }
    }
}

/// Payload for changing a book's reading status.
#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of `want_to_read`, `reading`, `completed`, `dropped`.
    pub status: String,
}

/// Payload for replacing a book's collection membership.
#[derive(Deserialize, ToSchema)]
pub struct UpdateCollectionsRequest {
    pub collection_ids: Vec<Uuid>,
}

/// Acknowledgement for a removal request.
#[derive(Serialize, ToSchema)]
pub struct RemoveResponse {
    /// False when the book was not in the library to begin with.
    pub success: bool,
}

//=========================================================================================
// Identity Helper
//=========================================================================================

/// Pulls the caller's id out of the `x-user-id` header.
fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, (StatusCode, String)> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-user-id header is required".to_string(),
            )
        })?;

    UserId::parse(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid x-user-id format".to_string(),
        )
    })
}

//=========================================================================================
// Progress Handlers
//=========================================================================================

/// Record reading progress within a chapter.
#[utoipa::path(
    post,
    path = "/progress",
    request_body = RecordProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = RecordProgressResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RecordProgressRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let update = app_state
        .tracker
        .record_progress(
            user_id,
            payload.book_id.into(),
            payload.chapter_id.into(),
            payload.progress,
            payload.time_spent_delta,
        )
        .await
        .map_err(engine_error_response)?;

    Ok(Json(RecordProgressResponse {
        chapter_progress: update.chapter_progress,
        chapter_status: update.chapter_status.as_str().to_string(),
        book_status: update.book_status.as_str().to_string(),
    }))
}

/// List the caller's chapter progress for one book.
#[utoipa::path(
    get,
    path = "/progress/{book_id}",
    responses(
        (status = 200, description = "Chapter progress rows", body = [ChapterProgressResponse]),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("book_id" = Uuid, Path, description = "The book to list progress for."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn book_progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let rows = app_state
        .tracker
        .book_progress(user_id, book_id.into())
        .await
        .map_err(engine_error_response)?;

    let response: Vec<ChapterProgressResponse> = rows
        .into_iter()
        .map(|row| ChapterProgressResponse {
            chapter_id: row.chapter_id.0,
            progress: row.progress,
            status: row.status.as_str().to_string(),
            time_spent_seconds: row.time_spent_seconds,
            last_read_at: row.last_read_at,
        })
        .collect();

    Ok(Json(response))
}

//=========================================================================================
// Reading Event Handlers
//=========================================================================================

/// Record a qualifying daily reading event.
///
/// Advances the streak machine (consuming a freeze when exactly one day
/// was missed) and credits XP for the event.
#[utoipa::path(
    post,
    path = "/readings",
    request_body = RecordReadingRequest,
    responses(
        (status = 200, description = "Reading recorded", body = ReadingSnapshotResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_reading_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RecordReadingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let snapshot = app_state
        .recorder
        .record_reading(user_id, payload.xp_amount)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(ReadingSnapshotResponse::from(snapshot)))
}

//=========================================================================================
// Stats Handlers
//=========================================================================================

/// Gamification stats for the calling user.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Per-user stats", body = UserStatsResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn user_stats_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let stats = app_state
        .stats
        .user_stats(user_id)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(UserStatsResponse {
        level: stats.level,
        total_xp: stats.total_xp,
        xp_for_next_level: stats.xp_for_next_level,
        progress_to_next_level: stats.progress_to_next_level,
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak,
        streak_freezes: stats.streak_freezes,
        last_read_date: stats.last_read_date,
        achievements_unlocked: stats.achievements_unlocked,
        achievements_in_progress: stats.achievements_in_progress,
    }))
}

/// Platform-wide gamification stats.
#[utoipa::path(
    get,
    path = "/stats/global",
    responses(
        (status = 200, description = "Global stats", body = GlobalStatsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn global_stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stats = app_state
        .stats
        .global_stats()
        .await
        .map_err(engine_error_response)?;

    Ok(Json(GlobalStatsResponse {
        readers: stats.readers,
        total_xp: stats.total_xp,
        longest_streak: stats.longest_streak,
        achievements_unlocked: stats.achievements_unlocked,
    }))
}

//=========================================================================================
// Achievement Handlers
//=========================================================================================

/// The active achievement catalog joined with the caller's progress.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Achievement overview", body = [AchievementEntryResponse]),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_achievements_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let overview = app_state
        .achievements
        .overview(user_id)
        .await
        .map_err(engine_error_response)?;

    let response: Vec<AchievementEntryResponse> = overview
        .into_iter()
        .map(AchievementEntryResponse::from)
        .collect();

    Ok(Json(response))
}

/// Apply progress toward an achievement, unlocking it when the
/// requirement is met.
#[utoipa::path(
    post,
    path = "/achievements/{code}/progress",
    request_body = AchievementProgressRequest,
    responses(
        (status = 200, description = "Progress applied", body = UnlockResponse),
        (status = 400, description = "Bad request (e.g., malformed code)"),
        (status = 404, description = "No achievement with this code"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("code" = String, Path, description = "The achievement's stable code."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn achievement_progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(payload): Json<AchievementProgressRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;
    let code = AchievementCode::new(code).map_err(engine_error_response)?;

    let outcome = app_state
        .achievements
        .apply_progress(user_id, &code, payload.progress_delta)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(UnlockResponse {
        unlocked: outcome.unlocked,
        newly_unlocked: outcome.newly_unlocked,
        progress: outcome.progress,
    }))
}

//=========================================================================================
// Library Handlers
//=========================================================================================

/// List the caller's reading list.
#[utoipa::path(
    get,
    path = "/library",
    responses(
        (status = 200, description = "Reading list entries", body = [LibraryEntryResponse]),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_library_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let entries = app_state
        .library
        .list(user_id)
        .await
        .map_err(engine_error_response)?;

    let response: Vec<LibraryEntryResponse> =
        entries.into_iter().map(LibraryEntryResponse::from).collect();

    Ok(Json(response))
}

/// Set the reading status of one book, adding it to the library if absent.
#[utoipa::path(
    put,
    path = "/library/{book_id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = LibraryEntryResponse),
        (status = 400, description = "Bad request (e.g., unknown status)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("book_id" = Uuid, Path, description = "The book to update."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_status_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;
    let status = payload
        .status
        .parse::<ReadingStatus>()
        .map_err(engine_error_response)?;

    let entry = app_state
        .library
        .update_status(user_id, book_id.into(), status)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(LibraryEntryResponse::from(entry)))
}

/// Replace the collection membership of one book.
#[utoipa::path(
    put,
    path = "/library/{book_id}/collections",
    request_body = UpdateCollectionsRequest,
    responses(
        (status = 200, description = "Collections updated", body = LibraryEntryResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("book_id" = Uuid, Path, description = "The book to update."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_collections_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<UpdateCollectionsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;
    let collections = payload.collection_ids.into_iter().map(Into::into).collect();

    let entry = app_state
        .library
        .update_collections(user_id, book_id.into(), collections)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(LibraryEntryResponse::from(entry)))
}

/// Remove a book from the library, cascading to its chapter progress.
#[utoipa::path(
    delete,
    path = "/library/{book_id}",
    responses(
        (status = 200, description = "Removal processed", body = RemoveResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("book_id" = Uuid, Path, description = "The book to remove."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn remove_book_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let removed = app_state
        .library
        .remove_from_library(user_id, book_id.into())
        .await
        .map_err(engine_error_response)?;

    Ok(Json(RemoveResponse { success: removed }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_request_defaults_xp() {
        let request: RecordReadingRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.xp_amount, DEFAULT_READING_XP);

        let request: RecordReadingRequest = serde_json::from_str(r#"{"xp_amount": 25}"#).unwrap();
        assert_eq!(request.xp_amount, 25);
    }

    #[test]
    fn test_achievement_request_defaults_delta() {
        let request: AchievementProgressRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.progress_delta, 1);
    }

    #[test]
    fn test_user_id_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(user_id_from_headers(&headers).is_err());

        headers.insert("x-user-id", "not-a-uuid".parse().unwrap());
        assert!(user_id_from_headers(&headers).is_err());

        let id = Uuid::new_v4();
        headers.insert("x-user-id", id.to_string().parse().unwrap());
        assert_eq!(user_id_from_headers(&headers).unwrap().0, id);
    }
}
