//! Client for the chaptering inference backend.

use crate::config::InferenceConfig;
use crate::error::{Error, Result};
use crate::upload::UploadFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Body of `POST /api/process-video`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessVideoRequest {
    pub video_url: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<Uuid>,
}

/// One chapter as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChapter {
    pub timestamp: String,
    pub title: String,
}

/// Response of both processing endpoints
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub video_duration: String,
    #[serde(default)]
    pub chapters: Vec<RawChapter>,
    #[serde(default)]
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A model offered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelDescriptor>,
}

/// Descriptor used when the backend cannot list its models
pub fn default_model() -> ModelDescriptor {
    ModelDescriptor {
        id: "meta-llama-3.1-8b".to_string(),
        name: "Meta Llama 3.1 8B".to_string(),
        description: "Meta's Llama 3.1 8B model via Vercel AI Gateway".to_string(),
        recommended: true,
        provider: Some("Vercel AI Gateway".to_string()),
    }
}

/// Remote chaptering backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Chapter a video reachable at `request.video_url`
    async fn process_video(&self, request: &ProcessVideoRequest) -> Result<InferenceResponse>;

    /// Chapter a video sent inline as multipart
    async fn process_file(&self, file: &UploadFile, model_name: &str)
        -> Result<InferenceResponse>;

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;
}

/// `reqwest` implementation of [`InferenceBackend`]
pub struct HttpInferenceClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Turn an HTTP response into a successful [`InferenceResponse`] or the
    /// backend's own error message.
    async fn read_response(response: reqwest::Response) -> Result<InferenceResponse> {
        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<InferenceResponse>(&body).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| "AI processing failed".to_string());
            warn!(status = %status, error = %message, "Inference backend returned an error");
            return Err(Error::Inference(message));
        }

        let parsed = parsed.ok_or_else(|| {
            Error::Inference("Inference backend returned an unreadable response".to_string())
        })?;

        if !parsed.success {
            return Err(Error::Inference(
                parsed
                    .error
                    .unwrap_or_else(|| "AI processing failed".to_string()),
            ));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceClient {
    #[instrument(skip(self, request), fields(model = %request.model_name))]
    async fn process_video(&self, request: &ProcessVideoRequest) -> Result<InferenceResponse> {
        let url = format!("{}/api/process-video", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;
        let result = Self::read_response(response).await?;

        debug!(
            chapters = result.chapters.len(),
            model_used = %result.model_used,
            "Video processed"
        );
        Ok(result)
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name, size_bytes = file.data.len()))]
    async fn process_file(
        &self,
        file: &UploadFile,
        model_name: &str,
    ) -> Result<InferenceResponse> {
        let url = format!("{}/api/process-file", self.base_url);

        // Bytes clones share the buffer
        let body = reqwest::Body::from(file.data.clone());
        let part = reqwest::multipart::Part::stream_with_length(body, file.size())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| Error::Validation(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("video", part)
            .text("model_name", model_name.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_response(response).await
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = format!("{}/api/models", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Inference(format!(
                "Failed to fetch models: {}",
                response.status()
            )));
        }

        let body: ModelsResponse = response.json().await?;
        Ok(body.models)
    }
}
