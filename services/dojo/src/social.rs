//! Social graph operations and the activity feed.
//!
//! The feed is assembled on read from three sources scoped to the viewer's
//! follow-set: public completed uploads, follow edges created by followed
//! users, and video likes by followed users. References are resolved with one
//! batched lookup per entity kind; entries whose user or video did not resolve
//! are dropped.

use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::models::{UserStats, UserSummary, VideoSummary};
use crate::store::{page_limit, SocialStore, UserStore, VideoStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// What happened in a feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Upload { video: VideoSummary },
    Follow { target_user: UserSummary },
    Like { video: VideoSummary },
}

impl ActivityKind {
    fn prefix(&self) -> &'static str {
        match self {
            ActivityKind::Upload { .. } => "upload",
            ActivityKind::Follow { .. } => "follow",
            ActivityKind::Like { .. } => "like",
        }
    }
}

/// One entry of the activity feed; `id` is `"{type}_{row_id}"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
}

impl ActivityItem {
    fn new(row_id: Uuid, kind: ActivityKind, user: UserSummary, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}_{}", kind.prefix(), row_id),
            kind,
            user,
            created_at,
        }
    }
}

pub struct SocialService {
    users: Arc<dyn UserStore>,
    videos: Arc<dyn VideoStore>,
    social: Arc<dyn SocialStore>,
    feed: FeedConfig,
}

impl SocialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        videos: Arc<dyn VideoStore>,
        social: Arc<dyn SocialStore>,
        feed: FeedConfig,
    ) -> Self {
        Self {
            users,
            videos,
            social,
            feed,
        }
    }

    /// Recent activity of the users `viewer_id` follows, newest first
    #[instrument(skip(self))]
    pub async fn activity_feed(&self, viewer_id: Uuid) -> Result<Vec<ActivityItem>> {
        let following = self.social.following_ids(viewer_id).await?;
        if following.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        items.extend(self.upload_items(&following).await);
        items.extend(self.follow_items(&following).await);
        items.extend(self.like_items(&following).await);

        // stable: equal timestamps keep upload, follow, like order
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(self.feed.max_items);

        debug!(entries = items.len(), "Activity feed assembled");
        Ok(items)
    }

    async fn upload_items(&self, following: &[Uuid]) -> Vec<ActivityItem> {
        let videos = match self
            .videos
            .recent_public_by_creators(following, self.feed.per_kind_limit)
            .await
        {
            Ok(videos) => videos,
            Err(e) => {
                warn!(error = %e, "Feed uploads query failed");
                return Vec::new();
            }
        };
        if videos.is_empty() {
            return Vec::new();
        }

        let creators = self
            .user_map(unique(videos.iter().map(|v| v.creator_id)))
            .await;

        videos
            .into_iter()
            .filter_map(|video| {
                let creator = creators.get(&video.creator_id)?.clone();
                let created_at = video.created_at;
                Some(ActivityItem::new(
                    video.id,
                    ActivityKind::Upload { video },
                    creator,
                    created_at,
                ))
            })
            .collect()
    }

    async fn follow_items(&self, following: &[Uuid]) -> Vec<ActivityItem> {
        let follows = match self
            .social
            .recent_follows_by(following, self.feed.per_kind_limit)
            .await
        {
            Ok(follows) => follows,
            Err(e) => {
                warn!(error = %e, "Feed follows query failed");
                return Vec::new();
            }
        };
        if follows.is_empty() {
            return Vec::new();
        }

        let users = self
            .user_map(unique(
                follows
                    .iter()
                    .flat_map(|f| [f.follower_id, f.following_id]),
            ))
            .await;

        follows
            .into_iter()
            .filter_map(|follow| {
                let follower = users.get(&follow.follower_id)?.clone();
                let target_user = users.get(&follow.following_id)?.clone();
                Some(ActivityItem::new(
                    follow.id,
                    ActivityKind::Follow { target_user },
                    follower,
                    follow.created_at,
                ))
            })
            .collect()
    }

    async fn like_items(&self, following: &[Uuid]) -> Vec<ActivityItem> {
        let likes = match self
            .social
            .recent_likes_by(following, self.feed.per_kind_limit)
            .await
        {
            Ok(likes) => likes,
            Err(e) => {
                warn!(error = %e, "Feed likes query failed");
                return Vec::new();
            }
        };
        if likes.is_empty() {
            return Vec::new();
        }

        let user_ids = unique(likes.iter().map(|l| l.user_id));
        let video_ids = unique(likes.iter().filter_map(|l| l.video_id));

        let (users, videos) = tokio::join!(self.user_map(user_ids), self.video_map(video_ids));

        likes
            .into_iter()
            .filter_map(|like| {
                let user = users.get(&like.user_id)?.clone();
                let video = videos.get(&like.video_id?)?.clone();
                Some(ActivityItem::new(
                    like.id,
                    ActivityKind::Like { video },
                    user,
                    like.created_at,
                ))
            })
            .collect()
    }

    /// Batched user lookup; a failed lookup resolves nothing
    async fn user_map(&self, ids: Vec<Uuid>) -> HashMap<Uuid, UserSummary> {
        match self.users.get_user_summaries(&ids).await {
            Ok(users) => users.into_iter().map(|u| (u.id, u)).collect(),
            Err(e) => {
                warn!(error = %e, "Feed user lookup failed");
                HashMap::new()
            }
        }
    }

    async fn video_map(&self, ids: Vec<Uuid>) -> HashMap<Uuid, VideoSummary> {
        match self.videos.get_video_summaries(&ids).await {
            Ok(videos) => videos.into_iter().map(|v| (v.id, v)).collect(),
            Err(e) => {
                warn!(error = %e, "Feed video lookup failed");
                HashMap::new()
            }
        }
    }

    /// Follow a user. Following twice is a no-op.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if follower_id == following_id {
            return Err(Error::Validation("Users cannot follow themselves".to_string()));
        }

        if self.social.insert_follow(follower_id, following_id).await? {
            metrics::counter!("dojo.social.follows").increment(1);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if self.social.delete_follow(follower_id, following_id).await? {
            metrics::counter!("dojo.social.unfollows").increment(1);
        }
        Ok(())
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        self.social.follow_exists(follower_id, following_id).await
    }

    /// Like a video. Liking twice is a no-op.
    #[instrument(skip(self))]
    pub async fn like_video(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        if self.social.insert_like(user_id, video_id).await? {
            metrics::counter!("dojo.social.likes").increment(1);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unlike_video(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        self.social.delete_like(user_id, video_id).await?;
        Ok(())
    }

    pub async fn has_liked_video(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        self.social.like_exists(user_id, video_id).await
    }

    /// Follower, following, video and like counts. Any failed count yields
    /// all zeros.
    pub async fn user_stats(&self, user_id: Uuid) -> UserStats {
        let (followers, following, videos, likes) = tokio::join!(
            self.social.count_followers(user_id),
            self.social.count_following(user_id),
            self.videos.count_by_creator(user_id),
            self.social.count_likes_by(user_id),
        );

        match (followers, following, videos, likes) {
            (Ok(follower_count), Ok(following_count), Ok(video_count), Ok(like_count)) => {
                UserStats {
                    follower_count,
                    following_count,
                    video_count,
                    like_count,
                }
            }
            (followers, following, videos, likes) => {
                let failure = [followers.err(), following.err(), videos.err(), likes.err()]
                    .into_iter()
                    .flatten()
                    .next();
                if let Some(e) = failure {
                    warn!(error = %e, user_id = %user_id, "Failed to load user stats");
                }
                UserStats::default()
            }
        }
    }

    /// Active users whose username or display name contains `query`,
    /// verified accounts first
    pub async fn search_users(&self, query: &str, limit: Option<i64>) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.users
            .search_users(query, page_limit(limit, DEFAULT_SEARCH_LIMIT))
            .await
    }
}

/// Deduplicate ids, keeping first-seen order
fn unique(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
