//! Video records: creation after upload, listing, chapters, deletion.

use crate::error::{Error, Result};
use crate::models::{ChapterMarker, NewVideo, Video};
use crate::object_store::StoredObject;
use crate::progress::ProgressSender;
use crate::store::{ChapterStore, VideoStore};
use crate::timestamp::format_timestamp;
use crate::upload::{UploadFile, UploadOrchestrator};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Title derived from a filename: the name without its last extension
pub fn title_from_filename(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.trim().is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

pub struct VideoLibrary {
    videos: Arc<dyn VideoStore>,
    chapters: Arc<dyn ChapterStore>,
    uploads: Arc<UploadOrchestrator>,
}

impl VideoLibrary {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        chapters: Arc<dyn ChapterStore>,
        uploads: Arc<UploadOrchestrator>,
    ) -> Self {
        Self {
            videos,
            chapters,
            uploads,
        }
    }

    /// Insert the `pending` row for a file already in the object store
    #[instrument(skip(self, stored, file), fields(path = %stored.path))]
    pub async fn create_from_upload(
        &self,
        owner_id: Uuid,
        stored: &StoredObject,
        file: &UploadFile,
    ) -> Result<Video> {
        let video = self
            .videos
            .insert_video(&NewVideo {
                creator_id: owner_id,
                title: title_from_filename(&file.file_name),
                file_path: stored.path.clone(),
                file_size_bytes: i64::try_from(file.size()).unwrap_or(i64::MAX),
                original_filename: Some(file.file_name.clone()),
            })
            .await?;

        info!(video_id = %video.id, "Video record created");
        Ok(video)
    }

    /// Upload a file and register it
    pub async fn upload_and_register(
        &self,
        file: &UploadFile,
        owner_id: Uuid,
        progress: &ProgressSender,
    ) -> Result<Video> {
        let stored = self.uploads.upload_video(file, owner_id, progress).await?;
        self.create_from_upload(owner_id, &stored, file).await
    }

    /// Owner's videos, newest first
    pub async fn list_videos(&self, owner_id: Uuid) -> Result<Vec<Video>> {
        self.videos.list_videos_for_owner(owner_id).await
    }

    /// Chapters of a video as display markers, ordered by start offset.
    /// Only the owner sees chapters of a video that is not public and
    /// completed.
    pub async fn chapters(&self, video_id: Uuid, viewer_id: Uuid) -> Result<Vec<ChapterMarker>> {
        if self
            .videos
            .get_visible_video(video_id, viewer_id)
            .await?
            .is_none()
        {
            return Err(not_found());
        }

        let chapters = self.chapters.list_chapters(video_id).await?;

        Ok(chapters
            .into_iter()
            .map(|c| ChapterMarker {
                timestamp: format_timestamp(c.timestamp_seconds),
                title: c.title,
                timestamp_seconds: c.timestamp_seconds,
            })
            .collect())
    }

    pub async fn has_chapters(&self, video_id: Uuid) -> Result<bool> {
        Ok(self.chapters.count_chapters(video_id).await? > 0)
    }

    /// Delete an owned video row, then its stored file. A failed file delete
    /// is logged; the row is already gone.
    #[instrument(skip(self))]
    pub async fn delete_video(&self, video_id: Uuid, owner_id: Uuid) -> Result<()> {
        let video = self
            .videos
            .get_video_for_owner(video_id, owner_id)
            .await?
            .ok_or_else(not_found)?;

        if !self.videos.delete_video(video_id, owner_id).await? {
            return Err(not_found());
        }

        if let Err(e) = self.uploads.delete_video_file(&video.file_path).await {
            warn!(error = %e, path = %video.file_path, "Failed to delete video file");
        }

        info!("Video deleted");
        Ok(())
    }

    /// Upload a thumbnail and point the video at it
    pub async fn set_thumbnail(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
        file: &UploadFile,
    ) -> Result<StoredObject> {
        if self
            .videos
            .get_video_for_owner(video_id, owner_id)
            .await?
            .is_none()
        {
            return Err(not_found());
        }

        let stored = self
            .uploads
            .upload_thumbnail(file, owner_id, video_id)
            .await?;

        if !self
            .videos
            .set_thumbnail_url(video_id, owner_id, &stored.url)
            .await?
        {
            return Err(not_found());
        }

        Ok(stored)
    }
}

fn not_found() -> Error {
    Error::NotFound("Video not found or access denied".to_string())
}
