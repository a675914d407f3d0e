//! In-memory collaborators for driving the orchestrators end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dojo_service::config::{FeedConfig, UploadConfig};
use dojo_service::inference::{InferenceResponse, ModelDescriptor, ProcessVideoRequest, RawChapter};
use dojo_service::models::{
    AccountType, Chapter, Follow, Like, NewChapter, NewUser, NewVideo, ProcessingStatus,
    ProfileUpdate, User, UserSummary, Video, VideoSummary, Visibility,
};
use dojo_service::{
    AiProcessor, Bucket, ChapterStore, Error, InferenceBackend, ObjectStore, Readiness, Result,
    SocialService, SocialStore, UploadFile, UploadOrchestrator, UserStore, VideoLibrary,
    VideoStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    chapters: Vec<Chapter>,
    follows: Vec<Follow>,
    likes: Vec<Like>,
}

/// All five tables behind one lock
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Number of list/lookup queries issued
    pub queries: AtomicUsize,
    pub fail_chapter_inserts: std::sync::atomic::AtomicBool,
    pub fail_mark_completed: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn count_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.tables.lock().unwrap().users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                email: format!("{}@example.com", username),
                display_name: None,
                avatar_url: None,
                bio: None,
                account_type: AccountType::Creator,
                is_verified: false,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Insert a public, completed video created `age` ago
    pub fn add_published_video(&self, creator_id: Uuid, title: &str, age: ChronoDuration) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = Utc::now() - age;
        self.tables.lock().unwrap().videos.insert(
            id,
            Video {
                processing_status: ProcessingStatus::Completed,
                created_at,
                updated_at: created_at,
                ..video_row(id, creator_id, title)
            },
        );
        id
    }

    pub fn add_follow_at(&self, follower_id: Uuid, following_id: Uuid, age: ChronoDuration) {
        self.tables.lock().unwrap().follows.push(Follow {
            id: Uuid::new_v4(),
            follower_id,
            following_id,
            created_at: Utc::now() - age,
        });
    }

    pub fn add_like_at(&self, user_id: Uuid, video_id: Uuid, age: ChronoDuration) {
        self.tables.lock().unwrap().likes.push(Like {
            id: Uuid::new_v4(),
            user_id,
            video_id: Some(video_id),
            created_at: Utc::now() - age,
        });
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.tables.lock().unwrap().videos.get(&id).cloned()
    }

    pub fn set_status(&self, id: Uuid, status: ProcessingStatus) {
        if let Some(video) = self.tables.lock().unwrap().videos.get_mut(&id) {
            video.processing_status = status;
        }
    }

    pub fn set_visibility(&self, id: Uuid, visibility: Visibility) {
        if let Some(video) = self.tables.lock().unwrap().videos.get_mut(&id) {
            video.visibility = visibility;
        }
    }

    pub fn follow_count(&self) -> usize {
        self.tables.lock().unwrap().follows.len()
    }
}

fn video_row(id: Uuid, creator_id: Uuid, title: &str) -> Video {
    let now = Utc::now();
    Video {
        id,
        creator_id,
        title: title.to_string(),
        description: None,
        thumbnail_url: None,
        file_path: format!("{}/{}.mp4", creator_id, id),
        file_size_bytes: 0,
        original_filename: None,
        duration_seconds: 0,
        processing_status: ProcessingStatus::Pending,
        processing_error: None,
        ai_confidence_score: None,
        visibility: Visibility::Public,
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        created_at: now,
        updated_at: now,
    }
}

fn summary(video: &Video) -> VideoSummary {
    VideoSummary {
        id: video.id,
        creator_id: video.creator_id,
        title: video.title.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        duration_seconds: video.duration_seconds,
        view_count: video.view_count,
        like_count: video.like_count,
        comment_count: video.comment_count,
        created_at: video.created_at,
    }
}

fn is_listed(video: &Video) -> bool {
    video.visibility == Visibility::Public && video.processing_status == ProcessingStatus::Completed
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>, limit: i64) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    rows.truncate(usize::try_from(limit).unwrap_or(0));
    rows
}

#[async_trait]
impl Readiness for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let row = User {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            bio: None,
            account_type: user.account_type,
            is_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        let cleared = |value: &String| Some(value.clone()).filter(|v| !v.is_empty());
        Ok(tables.users.get_mut(&id).map(|user| {
            if let Some(display_name) = &update.display_name {
                user.display_name = cleared(display_name);
            }
            if let Some(bio) = &update.bio {
                user.bio = cleared(bio);
            }
            if let Some(account_type) = update.account_type {
                user.account_type = account_type;
            }
            user.clone()
        }))
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> Result<()> {
        if let Some(user) = self.tables.lock().unwrap().users.get_mut(&id) {
            user.avatar_url = Some(avatar_url.to_string());
        }
        Ok(())
    }

    async fn get_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        self.count_query();
        let tables = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned().map(UserSummary::from))
            .collect())
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>> {
        self.count_query();
        let needle = query.to_lowercase();
        let tables = self.tables.lock().unwrap();
        let mut users: Vec<UserSummary> = tables
            .users
            .values()
            .filter(|u| u.is_active)
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u
                        .display_name
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .cloned()
            .map(UserSummary::from)
            .collect();
        users.sort_by_key(|u| std::cmp::Reverse(u.is_verified));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn insert_video(&self, video: &NewVideo) -> Result<Video> {
        let id = Uuid::new_v4();
        let row = Video {
            file_path: video.file_path.clone(),
            file_size_bytes: video.file_size_bytes,
            original_filename: video.original_filename.clone(),
            ..video_row(id, video.creator_id, &video.title)
        };
        self.tables.lock().unwrap().videos.insert(id, row.clone());
        Ok(row)
    }

    async fn get_video_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .videos
            .get(&id)
            .filter(|v| v.creator_id == owner_id)
            .cloned())
    }

    async fn get_visible_video(&self, id: Uuid, viewer_id: Uuid) -> Result<Option<Video>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .videos
            .get(&id)
            .filter(|v| v.creator_id == viewer_id || is_listed(v))
            .cloned())
    }

    async fn list_videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>> {
        let videos: Vec<Video> = self
            .tables
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| v.creator_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(videos, |v| v.created_at, i64::MAX))
    }

    async fn claim_for_processing(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.videos.get_mut(&id) {
            Some(video)
                if video.creator_id == owner_id
                    && video.processing_status.can_start_processing() =>
            {
                video.processing_status = ProcessingStatus::Processing;
                video.processing_error = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&self, id: Uuid, duration_seconds: i32, confidence: f32) -> Result<()> {
        if self.fail_mark_completed.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        if let Some(video) = self.tables.lock().unwrap().videos.get_mut(&id) {
            video.processing_status = ProcessingStatus::Completed;
            video.processing_error = None;
            video.duration_seconds = duration_seconds;
            video.ai_confidence_score = Some(confidence);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        if let Some(video) = self.tables.lock().unwrap().videos.get_mut(&id) {
            video.processing_status = ProcessingStatus::Failed;
            video.processing_error = Some(error.to_string());
        }
        Ok(())
    }

    async fn set_thumbnail_url(&self, id: Uuid, owner_id: Uuid, url: &str) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.videos.get_mut(&id) {
            Some(video) if video.creator_id == owner_id => {
                video.thumbnail_url = Some(url.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_video(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let owned = tables
            .videos
            .get(&id)
            .is_some_and(|v| v.creator_id == owner_id);
        if owned {
            tables.videos.remove(&id);
            tables.chapters.retain(|c| c.video_id != id);
            tables.likes.retain(|l| l.video_id != Some(id));
        }
        Ok(owned)
    }

    async fn recent_public_by_creators(
        &self,
        creator_ids: &[Uuid],
        limit: i64,
    ) -> Result<Vec<VideoSummary>> {
        self.count_query();
        let videos: Vec<VideoSummary> = self
            .tables
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| creator_ids.contains(&v.creator_id) && is_listed(v))
            .map(summary)
            .collect();
        Ok(newest_first(videos, |v| v.created_at, limit))
    }

    async fn get_video_summaries(&self, ids: &[Uuid]) -> Result<Vec<VideoSummary>> {
        self.count_query();
        let tables = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| tables.videos.get(id).map(summary))
            .collect())
    }

    async fn search_public(&self, query: &str, limit: i64) -> Result<Vec<VideoSummary>> {
        self.count_query();
        let needle = query.to_lowercase();
        let mut videos: Vec<VideoSummary> = self
            .tables
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| is_listed(v) && v.title.to_lowercase().contains(&needle))
            .map(summary)
            .collect();
        videos.sort_by_key(|v| std::cmp::Reverse(v.view_count));
        videos.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(videos)
    }

    async fn trending_public(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<VideoSummary>> {
        self.count_query();
        let mut videos: Vec<VideoSummary> = self
            .tables
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| is_listed(v) && v.created_at >= since)
            .map(summary)
            .collect();
        videos.sort_by_key(|v| std::cmp::Reverse(v.view_count));
        videos.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(videos)
    }

    async fn recent_public(&self, limit: i64) -> Result<Vec<VideoSummary>> {
        self.count_query();
        let videos: Vec<VideoSummary> = self
            .tables
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| is_listed(v))
            .map(summary)
            .collect();
        Ok(newest_first(videos, |v| v.created_at, limit))
    }

    async fn count_by_creator(&self, creator_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.videos.values().filter(|v| v.creator_id == creator_id).count() as i64)
    }
}

#[async_trait]
impl ChapterStore for MemoryStore {
    async fn replace_chapters(&self, video_id: Uuid, chapters: &[NewChapter]) -> Result<u64> {
        if self.fail_chapter_inserts.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.lock().unwrap();
        tables.chapters.retain(|c| c.video_id != video_id);
        for chapter in chapters {
            tables.chapters.push(Chapter {
                id: Uuid::new_v4(),
                video_id,
                timestamp_seconds: chapter.timestamp_seconds,
                duration_seconds: chapter.duration_seconds,
                title: chapter.title.clone(),
                ai_generated: chapter.ai_generated,
                ai_confidence_score: chapter.ai_confidence_score,
                human_edited: false,
                created_at: Utc::now(),
            });
        }
        Ok(chapters.len() as u64)
    }

    async fn list_chapters(&self, video_id: Uuid) -> Result<Vec<Chapter>> {
        let mut chapters: Vec<Chapter> = self
            .tables
            .lock()
            .unwrap()
            .chapters
            .iter()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.timestamp_seconds);
        Ok(chapters)
    }

    async fn count_chapters(&self, video_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.chapters.iter().filter(|c| c.video_id == video_id).count() as i64)
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn following_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>> {
        self.count_query();
        Ok(self
            .tables
            .lock()
            .unwrap()
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .map(|f| f.following_id)
            .collect())
    }

    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Ok(false);
        }
        tables.follows.push(Follow {
            id: Uuid::new_v4(),
            follower_id,
            following_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(tables.follows.len() < before)
    }

    async fn follow_exists(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id))
    }

    async fn recent_follows_by(&self, follower_ids: &[Uuid], limit: i64) -> Result<Vec<Follow>> {
        self.count_query();
        let follows: Vec<Follow> = self
            .tables
            .lock()
            .unwrap()
            .follows
            .iter()
            .filter(|f| follower_ids.contains(&f.follower_id))
            .cloned()
            .collect();
        Ok(newest_first(follows, |f| f.created_at, limit))
    }

    async fn insert_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.video_id == Some(video_id))
        {
            return Ok(false);
        }
        tables.likes.push(Like {
            id: Uuid::new_v4(),
            user_id,
            video_id: Some(video_id),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.likes.len();
        tables
            .likes
            .retain(|l| !(l.user_id == user_id && l.video_id == Some(video_id)));
        Ok(tables.likes.len() < before)
    }

    async fn like_exists(&self, user_id: Uuid, video_id: Uuid) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.video_id == Some(video_id)))
    }

    async fn recent_likes_by(&self, user_ids: &[Uuid], limit: i64) -> Result<Vec<Like>> {
        self.count_query();
        let likes: Vec<Like> = self
            .tables
            .lock()
            .unwrap()
            .likes
            .iter()
            .filter(|l| user_ids.contains(&l.user_id) && l.video_id.is_some())
            .cloned()
            .collect();
        Ok(newest_first(likes, |l| l.created_at, limit))
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.follows.iter().filter(|f| f.following_id == user_id).count() as i64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.follows.iter().filter(|f| f.follower_id == user_id).count() as i64)
    }

    async fn count_likes_by(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.likes.iter().filter(|l| l.user_id == user_id).count() as i64)
    }
}

/// Object store keeping objects in memory
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(Bucket, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn contains(&self, bucket: Bucket, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket, path.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        data: Bytes,
        _content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let mut objects = self.objects.lock().unwrap();
        let key = (bucket, path.to_string());
        if !upsert && objects.contains_key(&key) {
            return Err(Error::ObjectStore("The resource already exists".to_string()));
        }
        objects.insert(key, data);
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("https://storage.test/{:?}/{}", bucket, path)
    }

    async fn signed_url(&self, bucket: Bucket, path: &str, expires_in: Duration) -> Result<String> {
        if !self.contains(bucket, path) {
            return Err(Error::ObjectStore("Object not found".to_string()));
        }
        Ok(format!(
            "https://storage.test/signed/{}?expires={}",
            path,
            expires_in.as_secs()
        ))
    }

    async fn delete(&self, bucket: Bucket, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&(bucket, path.clone()));
        }
        Ok(())
    }
}

/// Inference backend returning queued outcomes. An optional gate holds calls
/// until released.
#[derive(Default)]
pub struct ScriptedInference {
    outcomes: Mutex<Vec<Result<InferenceResponse>>>,
    pub calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    pub entered: Arc<Notify>,
}

impl ScriptedInference {
    pub fn new(outcomes: Vec<Result<InferenceResponse>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
            ..Default::default()
        }
    }

    /// Calls block until `gate` has a permit
    pub fn gated(outcomes: Vec<Result<InferenceResponse>>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(outcomes)
        }
    }

    fn next(&self) -> Result<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Inference("no scripted outcome".to_string())))
    }
}

#[async_trait]
impl InferenceBackend for ScriptedInference {
    async fn process_video(&self, _request: &ProcessVideoRequest) -> Result<InferenceResponse> {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.next()
    }

    async fn process_file(&self, _file: &UploadFile, _model_name: &str) -> Result<InferenceResponse> {
        self.next()
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        Err(Error::Inference("models endpoint unavailable".to_string()))
    }
}

pub fn chapters_response(duration: &str, chapters: &[(&str, &str)]) -> InferenceResponse {
    InferenceResponse {
        success: true,
        video_duration: duration.to_string(),
        chapters: chapters
            .iter()
            .map(|(timestamp, title)| RawChapter {
                timestamp: timestamp.to_string(),
                title: title.to_string(),
            })
            .collect(),
        model_used: "meta-llama-3.1-8b".to_string(),
        error: None,
    }
}

pub fn video_file(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        content_type: "video/mp4".to_string(),
        data: Bytes::from(vec![7u8; 2048]),
    }
}

/// Orchestrators wired to shared in-memory collaborators
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub inference: Arc<ScriptedInference>,
    pub library: VideoLibrary,
    pub processor: Arc<AiProcessor>,
    pub social: SocialService,
}

impl Harness {
    pub fn new(inference: ScriptedInference) -> Self {
        let store = MemoryStore::new();
        let objects = Arc::new(MemoryObjectStore::default());
        let inference = Arc::new(inference);

        let uploads = Arc::new(UploadOrchestrator::new(
            objects.clone(),
            UploadConfig::default(),
        ));

        Self {
            library: VideoLibrary::new(store.clone(), store.clone(), uploads),
            processor: Arc::new(AiProcessor::new(
                store.clone(),
                store.clone(),
                objects.clone(),
                inference.clone(),
                "meta-llama-3.1-8b",
            )),
            social: SocialService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                FeedConfig::default(),
            ),
            store,
            objects,
            inference,
        }
    }
}
