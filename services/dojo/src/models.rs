//! Row types for the tables the service reads and writes.
//!
//! The schema is owned by the hosted database; these structs mirror the
//! columns this service relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account classification of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Viewer,
    Creator,
    Enterprise,
}

/// Processing status of a video
///
/// `pending -> processing -> completed | failed`, and `failed -> processing`
/// on an explicit retry. `completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Whether a processing run may claim a video in this state
    pub fn can_start_processing(&self) -> bool {
        matches!(self, ProcessingStatus::Pending | ProcessingStatus::Failed)
    }
}

/// Who can see a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    SubscribersOnly,
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub account_type: AccountType,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public subset of a user, used in feeds and search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub account_type: AccountType,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            avatar_url: u.avatar_url,
            is_verified: u.is_verified,
            account_type: u.account_type,
        }
    }
}

/// Fields for a user created on first sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub account_type: AccountType,
}

/// Self-service profile edit. Absent fields are left unchanged; an empty
/// string clears the field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
}

/// A stored video and its processing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub original_filename: Option<String>,
    pub duration_seconds: i32,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub ai_confidence_score: Option<f32>,
    pub visibility: Visibility,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a video row created after an upload completes
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub creator_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub original_filename: Option<String>,
}

/// Listing view of a public video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VideoSummary {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted chapter marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Chapter {
    pub id: Uuid,
    pub video_id: Uuid,
    pub timestamp_seconds: i32,
    pub duration_seconds: i32,
    pub title: String,
    pub ai_generated: bool,
    pub ai_confidence_score: Option<f32>,
    pub human_edited: bool,
    pub created_at: DateTime<Utc>,
}

/// Chapter row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewChapter {
    pub video_id: Uuid,
    pub timestamp_seconds: i32,
    pub duration_seconds: i32,
    pub title: String,
    pub ai_generated: bool,
    pub ai_confidence_score: Option<f32>,
}

/// Chapter as shown to callers: display timestamp plus offset in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub timestamp: String,
    pub title: String,
    pub timestamp_seconds: i32,
}

/// Directed follow edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Like edge; `video_id` is empty for likes on other content kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub video_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Social counters for a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub follower_count: i64,
    pub following_count: i64,
    pub video_count: i64,
    pub like_count: i64,
}
