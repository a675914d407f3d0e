//! Error types shared by every orchestrator and store client.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the service's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the service
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any network effect (file type, size, self-follow, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource missing or not owned by the caller; the two are not distinguished
    #[error("{0}")]
    NotFound(String),

    /// Another run currently owns the video's processing slot
    #[error("Video {0} is already being processed")]
    AlreadyProcessing(Uuid),

    /// Missing or invalid session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Relational store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object store failure
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// Inference backend failure, message passed through from the backend
    #[error("{0}")]
    Inference(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Machine-readable code used in API error bodies and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::AlreadyProcessing(_) => "ALREADY_PROCESSING",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Database(_) => "DATABASE_ERROR",
            Error::ObjectStore(_) => "STORAGE_ERROR",
            Error::Inference(_) => "INFERENCE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Inference(format!("Inference request failed: {}", e))
    }
}
