//! Relational store access.
//!
//! Each table group sits behind its own trait so orchestrators take only the
//! stores they use. [`PgStore`] implements all of them against Postgres.

mod postgres;

pub use postgres::PgStore;

use crate::error::Result;
use crate::models::{
    Chapter, Follow, Like, NewChapter, NewUser, NewVideo, ProfileUpdate, User, UserSummary, Video,
    VideoSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Largest page any listing query returns
pub const MAX_PAGE_SIZE: i64 = 100;

/// Caller-supplied row limit, defaulted and clamped to `1..=MAX_PAGE_SIZE`
pub fn page_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Connectivity check behind `/ready`
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

/// Queries against `users`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert_user(&self, user: &NewUser) -> Result<User>;

    /// Apply a partial profile edit: `None` fields are kept, empty strings
    /// are stored as NULL. `None` when the user does not exist
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>>;

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> Result<()>;

    /// Batched lookup; missing ids are simply absent from the result
    async fn get_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>>;

    /// Case-insensitive substring match on username and display name among
    /// active users, verified accounts first
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>>;
}

/// Queries against `videos`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert_video(&self, video: &NewVideo) -> Result<Video>;

    /// Fetch a video only if `owner_id` created it
    async fn get_video_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>>;

    /// Fetch a video `viewer_id` may read: their own, or any public,
    /// completed video
    async fn get_visible_video(&self, id: Uuid, viewer_id: Uuid) -> Result<Option<Video>>;

    /// Owner's videos, newest first
    async fn list_videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>>;

    /// Move `pending|failed -> processing` atomically. `false` when the video
    /// is not in a claimable state (or not owned by `owner_id`).
    async fn claim_for_processing(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    async fn mark_completed(&self, id: Uuid, duration_seconds: i32, confidence: f32) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;

    async fn set_thumbnail_url(&self, id: Uuid, owner_id: Uuid, url: &str) -> Result<bool>;

    /// Delete an owned video row; `false` when nothing matched
    async fn delete_video(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    /// Public, completed videos by any of `creator_ids`, newest first
    async fn recent_public_by_creators(
        &self,
        creator_ids: &[Uuid],
        limit: i64,
    ) -> Result<Vec<VideoSummary>>;

    /// Batched lookup; missing ids are simply absent from the result
    async fn get_video_summaries(&self, ids: &[Uuid]) -> Result<Vec<VideoSummary>>;

    /// Public, completed videos whose title contains `query`, most viewed first
    async fn search_public(&self, query: &str, limit: i64) -> Result<Vec<VideoSummary>>;

    /// Public, completed videos created since `since`, most viewed first
    async fn trending_public(&self, since: DateTime<Utc>, limit: i64)
        -> Result<Vec<VideoSummary>>;

    /// Public, completed videos, newest first
    async fn recent_public(&self, limit: i64) -> Result<Vec<VideoSummary>>;

    async fn count_by_creator(&self, creator_id: Uuid) -> Result<i64>;
}

/// Queries against `chapters`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Swaps the video's chapter set for `chapters` in one transaction;
    /// returns the number of rows written
    async fn replace_chapters(&self, video_id: Uuid, chapters: &[NewChapter]) -> Result<u64>;

    /// Chapters of a video ordered by start offset
    async fn list_chapters(&self, video_id: Uuid) -> Result<Vec<Chapter>>;

    async fn count_chapters(&self, video_id: Uuid) -> Result<i64>;
}

/// Queries against `follows` and `likes`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Ids the user follows
    async fn following_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>>;

    /// Insert a follow edge; `false` when it already existed
    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool>;

    /// Delete a follow edge; `false` when there was none
    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool>;

    async fn follow_exists(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool>;

    /// Follow edges created by any of `follower_ids`, newest first
    async fn recent_follows_by(&self, follower_ids: &[Uuid], limit: i64) -> Result<Vec<Follow>>;

    /// Insert a like; `false` when it already existed
    async fn insert_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool>;

    /// Delete a like; `false` when there was none
    async fn delete_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool>;

    async fn like_exists(&self, user_id: Uuid, video_id: Uuid) -> Result<bool>;

    /// Video likes by any of `user_ids`, newest first
    async fn recent_likes_by(&self, user_ids: &[Uuid], limit: i64) -> Result<Vec<Like>>;

    async fn count_followers(&self, user_id: Uuid) -> Result<i64>;

    async fn count_following(&self, user_id: Uuid) -> Result<i64>;

    async fn count_likes_by(&self, user_id: Uuid) -> Result<i64>;
}
