//! Upload orchestration: validation, object paths, progress.

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::object_store::{content_type_or_default, Bucket, ObjectStore, StoredObject};
use crate::progress::{ProgressSender, ProgressStage};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// A file received from a client
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Extension of the original filename, `bin` when there is none
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
            _ => "bin",
        }
    }
}

/// Writes client files to the object store
pub struct UploadOrchestrator {
    object_store: Arc<dyn ObjectStore>,
    config: UploadConfig,
}

impl UploadOrchestrator {
    pub fn new(object_store: Arc<dyn ObjectStore>, config: UploadConfig) -> Self {
        Self {
            object_store,
            config,
        }
    }

    /// Reject files with a disallowed type or over the size limit
    pub fn validate(&self, file: &UploadFile) -> Result<()> {
        if !self
            .config
            .allowed_content_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&file.content_type))
        {
            return Err(Error::Validation(
                "Invalid file type. Please upload MP4, AVI, MOV, WMV, FLV, WebM, or MKV files."
                    .to_string(),
            ));
        }

        if file.size() > self.config.max_file_size_bytes {
            return Err(Error::Validation(format!(
                "File too large. Maximum size is {}MB.",
                self.config.max_file_size_bytes / (1024 * 1024)
            )));
        }

        Ok(())
    }

    /// Store a video under `{owner_id}/{millis}_{uuid}.{ext}` in the videos
    /// bucket. Invalid files fail before any progress event is emitted.
    #[instrument(skip(self, file, progress), fields(file_name = %file.file_name, size_bytes = file.size()))]
    pub async fn upload_video(
        &self,
        file: &UploadFile,
        owner_id: Uuid,
        progress: &ProgressSender,
    ) -> Result<StoredObject> {
        if let Err(e) = self.validate(file) {
            metrics::counter!("dojo.uploads.rejected").increment(1);
            return Err(e);
        }

        let started = Instant::now();
        progress.emit(0, ProgressStage::Uploading, "Starting upload...");

        let path = format!(
            "{}/{}_{}.{}",
            owner_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            file.extension()
        );

        progress.emit(10, ProgressStage::Uploading, "Uploading file...");

        let stored = self
            .object_store
            .upload(
                Bucket::Videos,
                &path,
                file.data.clone(),
                content_type_or_default(&file.content_type),
                false,
            )
            .await;

        let stored_path = match stored {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, path = %path, "Video upload failed");
                metrics::counter!("dojo.uploads.failed").increment(1);
                progress.error(e.to_string());
                return Err(e);
            }
        };

        progress.emit(80, ProgressStage::Processing, "Generating access URL...");
        let url = self.object_store.public_url(Bucket::Videos, &stored_path);
        progress.emit(100, ProgressStage::Complete, "Upload complete!");

        metrics::counter!("dojo.uploads.completed").increment(1);
        metrics::counter!("dojo.uploads.bytes").increment(file.size());
        metrics::histogram!("dojo.uploads.duration_seconds")
            .record(started.elapsed().as_secs_f64());

        info!(path = %stored_path, "Video uploaded");
        Ok(StoredObject {
            path: stored_path,
            url,
        })
    }

    /// Store a thumbnail at `{owner_id}/{video_id}_thumbnail.{ext}`, replacing any previous one
    pub async fn upload_thumbnail(
        &self,
        file: &UploadFile,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<StoredObject> {
        let path = format!("{}/{}_thumbnail.{}", owner_id, video_id, file.extension());
        self.put_public(Bucket::Thumbnails, path, file).await
    }

    /// Store an avatar at `{user_id}/avatar.{ext}`, replacing any previous one
    pub async fn upload_avatar(&self, file: &UploadFile, user_id: Uuid) -> Result<StoredObject> {
        let path = format!("{}/avatar.{}", user_id, file.extension());
        self.put_public(Bucket::Avatars, path, file).await
    }

    /// Remove a stored video file
    pub async fn delete_video_file(&self, path: &str) -> Result<()> {
        self.object_store
            .delete(Bucket::Videos, &[path.to_string()])
            .await
    }

    async fn put_public(
        &self,
        bucket: Bucket,
        path: String,
        file: &UploadFile,
    ) -> Result<StoredObject> {
        if file.data.is_empty() {
            return Err(Error::Validation("File is empty".to_string()));
        }

        let stored_path = self
            .object_store
            .upload(
                bucket,
                &path,
                file.data.clone(),
                content_type_or_default(&file.content_type),
                true,
            )
            .await?;

        let url = self.object_store.public_url(bucket, &stored_path);
        Ok(StoredObject {
            path: stored_path,
            url,
        })
    }
}
