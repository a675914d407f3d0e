//! AI processing orchestrator.
//!
//! A run claims the video (`pending|failed -> processing`) with a conditional
//! update, asks the inference backend for chapters through a signed URL,
//! persists the chapters and marks the video `completed`. Any failure after
//! the claim marks the video `failed` with the error message. Progress is
//! reported on a [`ProgressSender`] at 10/30/50/80/100 percent.

use crate::error::{Error, Result};
use crate::inference::{default_model, InferenceBackend, ModelDescriptor, ProcessVideoRequest, RawChapter};
use crate::models::{ChapterMarker, NewChapter, ProcessingStatus, Video};
use crate::object_store::{Bucket, ObjectStore};
use crate::progress::{ProgressSender, ProgressStage};
use crate::store::{ChapterStore, VideoStore};
use crate::timestamp::{chapter_durations, parse_timestamp};
use crate::upload::UploadFile;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Confidence recorded for machine-generated chapters
pub const DEFAULT_CONFIDENCE: f32 = 0.85;

const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// A request to chapter a stored video
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub video_id: Uuid,
    pub owner_id: Uuid,
    /// Model to use; the configured default when `None`
    pub model: Option<String>,
}

pub struct AiProcessor {
    videos: Arc<dyn VideoStore>,
    chapters: Arc<dyn ChapterStore>,
    object_store: Arc<dyn ObjectStore>,
    inference: Arc<dyn InferenceBackend>,
    default_model: String,
    signed_url_ttl: Duration,
}

impl AiProcessor {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        chapters: Arc<dyn ChapterStore>,
        object_store: Arc<dyn ObjectStore>,
        inference: Arc<dyn InferenceBackend>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            videos,
            chapters,
            object_store,
            inference,
            default_model: default_model.into(),
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    /// Lifetime of the URL handed to the inference backend
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Chapter a stored video owned by `request.owner_id`.
    ///
    /// Returns the chapter markers ordered by start offset. Rejects with
    /// [`Error::AlreadyProcessing`] when another run holds the video.
    #[instrument(skip(self, progress), fields(video_id = %request.video_id))]
    pub async fn process_stored_video(
        &self,
        request: &ProcessRequest,
        progress: &ProgressSender,
    ) -> Result<Vec<ChapterMarker>> {
        let started = Instant::now();
        metrics::counter!("dojo.processing.started").increment(1);

        progress.emit(10, ProgressStage::Downloading, "Fetching video information...");

        let video = match self.claim(request).await {
            Ok(video) => video,
            Err(e) => {
                warn!(error = %e, "Processing rejected");
                metrics::counter!("dojo.processing.rejected").increment(1);
                progress.error(e.to_string());
                return Err(e);
            }
        };

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        match self.run_claimed(&video, &model, progress).await {
            Ok(markers) => {
                metrics::counter!("dojo.processing.completed").increment(1);
                metrics::histogram!("dojo.processing.duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                info!(chapters = markers.len(), model = %model, "Video processed");
                progress.complete("Processing complete!", markers.clone());
                Ok(markers)
            }
            Err(e) => {
                error!(error = %e, "Processing failed");
                metrics::counter!("dojo.processing.failed").increment(1);

                if let Err(write_err) = self.videos.mark_failed(video.id, &e.to_string()).await {
                    error!(error = %write_err, "Failed to record processing failure");
                }

                progress.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Owner-scoped fetch followed by the conditional status claim
    async fn claim(&self, request: &ProcessRequest) -> Result<Video> {
        let video = self
            .videos
            .get_video_for_owner(request.video_id, request.owner_id)
            .await?
            .ok_or_else(|| Error::NotFound("Video not found or access denied".to_string()))?;

        match video.processing_status {
            ProcessingStatus::Processing => return Err(Error::AlreadyProcessing(video.id)),
            ProcessingStatus::Completed => {
                return Err(Error::Validation(
                    "Video has already been processed".to_string(),
                ))
            }
            ProcessingStatus::Pending | ProcessingStatus::Failed => {}
        }

        if !self
            .videos
            .claim_for_processing(video.id, request.owner_id)
            .await?
        {
            return Err(Error::AlreadyProcessing(video.id));
        }

        Ok(video)
    }

    async fn run_claimed(
        &self,
        video: &Video,
        model: &str,
        progress: &ProgressSender,
    ) -> Result<Vec<ChapterMarker>> {
        progress.emit(30, ProgressStage::Processing, "Generating secure access URL...");

        let video_url = self
            .object_store
            .signed_url(Bucket::Videos, &video.file_path, self.signed_url_ttl)
            .await?;

        progress.emit(50, ProgressStage::Processing, "Analyzing video with AI...");

        let response = self
            .inference
            .process_video(&ProcessVideoRequest {
                video_url,
                model_name: model.to_string(),
                video_id: Some(video.id),
            })
            .await?;

        progress.emit(80, ProgressStage::SavingResults, "Saving chapters to database...");

        let markers = to_markers(&response.chapters);
        let rows = chapter_rows(video.id, &markers);

        if let Err(e) = self.chapters.replace_chapters(video.id, &rows).await {
            warn!(error = %e, count = rows.len(), "Failed to save chapters");
        }

        self.videos
            .mark_completed(
                video.id,
                parse_timestamp(&response.video_duration),
                DEFAULT_CONFIDENCE,
            )
            .await?;

        Ok(markers)
    }

    /// Legacy direct flow: send the bytes to the backend and return the
    /// chapters. Nothing is stored.
    #[instrument(skip(self, file, progress), fields(file_name = %file.file_name))]
    pub async fn process_uploaded_file(
        &self,
        file: &UploadFile,
        model: Option<&str>,
        progress: &ProgressSender,
    ) -> Result<Vec<ChapterMarker>> {
        let model = model.unwrap_or(&self.default_model);

        progress.emit(10, ProgressStage::Uploading, "Uploading video...");
        progress.emit(50, ProgressStage::Processing, "Analyzing video with AI...");

        match self.inference.process_file(file, model).await {
            Ok(response) => {
                let markers = to_markers(&response.chapters);
                progress.complete("Processing complete!", markers.clone());
                Ok(markers)
            }
            Err(e) => {
                progress.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Models offered by the backend, or the default model when it cannot say
    pub async fn available_models(&self) -> Vec<ModelDescriptor> {
        match self.inference.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => vec![default_model()],
            Err(e) => {
                warn!(error = %e, "Failed to fetch models, using default");
                vec![default_model()]
            }
        }
    }
}

/// Parse backend chapters and order them by start offset
fn to_markers(raw: &[RawChapter]) -> Vec<ChapterMarker> {
    let mut markers: Vec<ChapterMarker> = raw
        .iter()
        .map(|c| ChapterMarker {
            timestamp: c.timestamp.clone(),
            title: c.title.clone(),
            timestamp_seconds: parse_timestamp(&c.timestamp),
        })
        .collect();

    markers.sort_by_key(|m| m.timestamp_seconds);
    markers
}

fn chapter_rows(video_id: Uuid, markers: &[ChapterMarker]) -> Vec<NewChapter> {
    let starts: Vec<i32> = markers.iter().map(|m| m.timestamp_seconds).collect();

    markers
        .iter()
        .zip(chapter_durations(&starts))
        .map(|(marker, duration_seconds)| NewChapter {
            video_id,
            timestamp_seconds: marker.timestamp_seconds,
            duration_seconds,
            title: marker.title.clone(),
            ai_generated: true,
            ai_confidence_score: Some(DEFAULT_CONFIDENCE),
        })
        .collect()
}
