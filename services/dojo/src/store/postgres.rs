use super::{ChapterStore, Readiness, SocialStore, UserStore, VideoStore};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{
    Chapter, Follow, Like, NewChapter, NewUser, NewVideo, ProfileUpdate, User, UserSummary, Video,
    VideoSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, display_name, avatar_url, bio, account_type, \
     is_verified, is_active, created_at, updated_at";

const USER_SUMMARY_COLUMNS: &str =
    "id, username, display_name, avatar_url, is_verified, account_type";

const VIDEO_COLUMNS: &str = "id, creator_id, title, description, thumbnail_url, file_path, \
     file_size_bytes, original_filename, duration_seconds, processing_status, processing_error, \
     ai_confidence_score, visibility, view_count, like_count, comment_count, created_at, updated_at";

const VIDEO_SUMMARY_COLUMNS: &str = "id, creator_id, title, thumbnail_url, duration_seconds, \
     view_count, like_count, comment_count, created_at";

const CHAPTER_COLUMNS: &str = "id, video_id, timestamp_seconds, duration_seconds, title, \
     ai_generated, ai_confidence_score, human_edited, created_at";

/// Postgres-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Apply the bundled schema
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        info!("Database migrations completed");
        Ok(())
    }
}

/// `%query%` with LIKE metacharacters escaped
fn contains_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl Readiness for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, username, display_name, avatar_url, account_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.account_type)
        .fetch_one(&self.pool)
        .await?;

        debug!(username = %created.username, "User created");
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET display_name = CASE WHEN $2::text IS NULL THEN display_name ELSE NULLIF($2, '') END,
                bio = CASE WHEN $3::text IS NULL THEN bio ELSE NULLIF($3, '') END,
                account_type = COALESCE($4, account_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.bio)
        .bind(update.account_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> Result<()> {
        sqlx::query("UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(avatar_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {USER_SUMMARY_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            r#"
            SELECT {USER_SUMMARY_COLUMNS} FROM users
            WHERE is_active
              AND (username ILIKE $1 OR display_name ILIKE $1)
            ORDER BY is_verified DESC
            LIMIT $2
            "#
        ))
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl VideoStore for PgStore {
    #[instrument(skip(self, video), fields(creator_id = %video.creator_id))]
    async fn insert_video(&self, video: &NewVideo) -> Result<Video> {
        let created = sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (
                id, creator_id, title, file_path, file_size_bytes,
                original_filename, processing_status
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(video.creator_id)
        .bind(&video.title)
        .bind(&video.file_path)
        .bind(video.file_size_bytes)
        .bind(&video.original_filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_video_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND creator_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    async fn get_visible_video(&self, id: Uuid, viewer_id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            r#"
            SELECT {VIDEO_COLUMNS} FROM videos
            WHERE id = $1
              AND (creator_id = $2
                   OR (visibility = 'public' AND processing_status = 'completed'))
            "#
        ))
        .bind(id)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    async fn list_videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE creator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn claim_for_processing(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET processing_status = 'processing', processing_error = NULL, updated_at = NOW()
            WHERE id = $1
              AND creator_id = $2
              AND processing_status IN ('pending', 'failed')
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn mark_completed(&self, id: Uuid, duration_seconds: i32, confidence: f32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE videos
            SET processing_status = 'completed',
                processing_error = NULL,
                duration_seconds = $2,
                ai_confidence_score = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(duration_seconds)
        .bind(confidence)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE videos
            SET processing_status = 'failed', processing_error = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_thumbnail_url(&self, id: Uuid, owner_id: Uuid, url: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE videos SET thumbnail_url = $3, updated_at = NOW() WHERE id = $1 AND creator_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn delete_video(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn recent_public_by_creators(
        &self,
        creator_ids: &[Uuid],
        limit: i64,
    ) -> Result<Vec<VideoSummary>> {
        let videos = sqlx::query_as::<_, VideoSummary>(&format!(
            r#"
            SELECT {VIDEO_SUMMARY_COLUMNS} FROM videos
            WHERE creator_id = ANY($1)
              AND visibility = 'public'
              AND processing_status = 'completed'
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(creator_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    async fn get_video_summaries(&self, ids: &[Uuid]) -> Result<Vec<VideoSummary>> {
        let videos = sqlx::query_as::<_, VideoSummary>(&format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS} FROM videos WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn search_public(&self, query: &str, limit: i64) -> Result<Vec<VideoSummary>> {
        let videos = sqlx::query_as::<_, VideoSummary>(&format!(
            r#"
            SELECT {VIDEO_SUMMARY_COLUMNS} FROM videos
            WHERE visibility = 'public'
              AND processing_status = 'completed'
              AND title ILIKE $1
            ORDER BY view_count DESC
            LIMIT $2
            "#
        ))
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    async fn trending_public(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<VideoSummary>> {
        let videos = sqlx::query_as::<_, VideoSummary>(&format!(
            r#"
            SELECT {VIDEO_SUMMARY_COLUMNS} FROM videos
            WHERE visibility = 'public'
              AND processing_status = 'completed'
              AND created_at >= $1
            ORDER BY view_count DESC
            LIMIT $2
            "#
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    async fn recent_public(&self, limit: i64) -> Result<Vec<VideoSummary>> {
        let videos = sqlx::query_as::<_, VideoSummary>(&format!(
            r#"
            SELECT {VIDEO_SUMMARY_COLUMNS} FROM videos
            WHERE visibility = 'public'
              AND processing_status = 'completed'
            ORDER BY created_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    async fn count_by_creator(&self, creator_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE creator_id = $1")
            .bind(creator_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ChapterStore for PgStore {
    #[instrument(skip(self, chapters), fields(count = chapters.len()))]
    async fn replace_chapters(&self, video_id: Uuid, chapters: &[NewChapter]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM chapters WHERE video_id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if chapters.is_empty() {
            tx.commit().await?;
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO chapters (id, video_id, timestamp_seconds, duration_seconds, title, \
             ai_generated, ai_confidence_score, human_edited) ",
        );

        builder.push_values(chapters, |mut row, chapter| {
            row.push_bind(Uuid::new_v4())
                .push_bind(video_id)
                .push_bind(chapter.timestamp_seconds)
                .push_bind(chapter.duration_seconds)
                .push_bind(chapter.title.clone())
                .push_bind(chapter.ai_generated)
                .push_bind(chapter.ai_confidence_score)
                .push_bind(false);
        });

        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        debug!(removed, rows = result.rows_affected(), "Chapters replaced");
        Ok(result.rows_affected())
    }

    async fn list_chapters(&self, video_id: Uuid) -> Result<Vec<Chapter>> {
        let chapters = sqlx::query_as::<_, Chapter>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE video_id = $1 ORDER BY timestamp_seconds ASC"
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chapters)
    }

    async fn count_chapters(&self, video_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn following_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT following_id FROM follows WHERE follower_id = $1")
                .bind(follower_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (id, follower_id, following_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn recent_follows_by(&self, follower_ids: &[Uuid], limit: i64) -> Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, follower_id, following_id, created_at FROM follows
            WHERE follower_id = ANY($1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(follower_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }

    #[instrument(skip(self))]
    async fn insert_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO likes (id, user_id, video_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, video_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn delete_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND video_id = $2")
            .bind(user_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn like_exists(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND video_id = $2)",
        )
        .bind(user_id)
        .bind(video_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn recent_likes_by(&self, user_ids: &[Uuid], limit: i64) -> Result<Vec<Like>> {
        let likes = sqlx::query_as::<_, Like>(
            r#"
            SELECT id, user_id, video_id, created_at FROM likes
            WHERE user_id = ANY($1)
              AND video_id IS NOT NULL
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_likes_by(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
