//! Public video discovery: title search, trending, recent.

use crate::error::Result;
use crate::models::VideoSummary;
use crate::store::{page_limit, VideoStore};
use chrono::{Duration, Utc};
use std::sync::Arc;

const SEARCH_LIMIT: i64 = 10;
const LISTING_LIMIT: i64 = 20;
const TRENDING_WINDOW_DAYS: i64 = 7;

pub struct Discovery {
    videos: Arc<dyn VideoStore>,
}

impl Discovery {
    pub fn new(videos: Arc<dyn VideoStore>) -> Self {
        Self { videos }
    }

    /// Public videos whose title contains `query`, most viewed first
    pub async fn search_videos(&self, query: &str, limit: Option<i64>) -> Result<Vec<VideoSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.videos
            .search_public(query, page_limit(limit, SEARCH_LIMIT))
            .await
    }

    /// Most viewed public videos of the last week
    pub async fn trending_videos(&self, limit: Option<i64>) -> Result<Vec<VideoSummary>> {
        let since = Utc::now() - Duration::days(TRENDING_WINDOW_DAYS);
        self.videos
            .trending_public(since, page_limit(limit, LISTING_LIMIT))
            .await
    }

    pub async fn recent_videos(&self, limit: Option<i64>) -> Result<Vec<VideoSummary>> {
        self.videos
            .recent_public(page_limit(limit, LISTING_LIMIT))
            .await
    }
}
